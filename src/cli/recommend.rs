use colored::Colorize;

use crate::{
    cli::{AnnotateMode, Context, fail},
    success,
    types::{Recommendation, TimeRange},
    utils,
};

pub async fn recommend(ctx: &Context, window: TimeRange, annotate: AnnotateMode) {
    let pipeline = ctx.pipeline(Some(window));
    let annotator = ctx.annotator(annotate);

    let pb = utils::spinner("Finding your perfect song...");
    let result = pipeline.run(annotator.as_deref()).await;
    pb.finish_and_clear();

    match result {
        Ok(recommendation) => {
            success!("Your song of the day is ready!");
            print_recommendation(&recommendation);
        }
        Err(e) => fail(&e),
    }
}

pub fn print_recommendation(recommendation: &Recommendation) {
    let track = &recommendation.track;

    println!();
    println!("  {}", track.name.bold());
    println!("  {}", track.artist_names());
    println!("  Album: {}", track.album.name.dimmed());
    if let Some(url) = &track.external_urls.spotify {
        println!("  Open in Spotify: {}", url);
    }
    if let Some(preview) = &track.preview_url {
        println!("  Preview: {}", preview);
    }
    if let Some(cover) = track.cover_url() {
        println!("  Cover: {}", cover.dimmed());
    }
    if let Some(annotation) = &recommendation.annotation {
        println!();
        println!("  {}", "Why you might like it:".bold());
        println!("  {}", annotation);
    }
    println!();
}
