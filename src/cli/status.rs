use chrono::{DateTime, Local};

use crate::{
    cli::{Context, fail},
    info, success, utils,
};

pub async fn status(ctx: &Context) {
    let pipeline = ctx.pipeline(None);

    let pb = utils::spinner("Checking Spotify connection...");
    let result = pipeline.validate().await;
    pb.finish_and_clear();

    let profile = match result {
        Ok(p) => p,
        Err(e) => fail(&e),
    };

    success!(
        "Connected as {} ({}).",
        profile.display_name.as_deref().unwrap_or(&profile.id),
        profile.country.as_deref().unwrap_or("unknown market")
    );

    if let Ok(Some(token)) = ctx.tokens.load().await {
        if let Some(expires_at) = token
            .expires_at
            .and_then(|at| DateTime::from_timestamp(at as i64, 0))
        {
            info!(
                "Session expires around {}.",
                expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            );
        }
    }
}
