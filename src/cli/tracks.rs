use tabled::Table;

use crate::{
    cli::{Context, fail},
    types::{TimeRange, TrackTableRow},
    utils, warning,
};

pub async fn top(ctx: &Context, window: TimeRange, limit: Option<u32>) {
    let mut options = ctx.options(Some(window));
    if let Some(limit) = limit {
        options.history_limit = limit.clamp(1, 50);
    }
    let pipeline = ctx.pipeline_with(options);

    let pb = utils::spinner(&format!("Fetching top tracks ({})...", window));
    let result = pipeline.top_tracks().await;
    pb.finish_and_clear();

    match result {
        Ok(tracks) => println!("{}", Table::new(TrackTableRow::from_tracks(&tracks))),
        Err(e) => fail(&e),
    }
}

pub async fn recent(ctx: &Context, limit: u32) {
    let pipeline = ctx.pipeline(None);

    let pb = utils::spinner("Fetching recently played tracks...");
    let result = pipeline.recently_played(limit).await;
    pb.finish_and_clear();

    match result {
        Ok(tracks) if tracks.is_empty() => warning!("Nothing played recently."),
        Ok(tracks) => println!("{}", Table::new(TrackTableRow::from_tracks(&tracks))),
        Err(e) => fail(&e),
    }
}
