use chrono::{Local, NaiveTime};

use crate::{
    cli::{AnnotateMode, Context, fail, recommend::print_recommendation},
    error::ErrorCategory,
    info,
    scheduler::DailySchedule,
    success,
    types::TimeRange,
    warning,
};

/// Runs the pipeline every day at `at` until an authentication or local
/// failure. Data and transport failures skip that day.
///
/// Delivery is to the terminal; the stored phone number is only shown.
pub async fn daily(ctx: &Context, at: Option<NaiveTime>, window: TimeRange, annotate: AnnotateMode) {
    let schedule = DailySchedule::new(at.unwrap_or(ctx.config.daily_at));
    let pipeline = ctx.pipeline(Some(window));
    let annotator = ctx.annotator(annotate);

    if let Ok(Some(phone)) = ctx.tokens.phone_number().await {
        info!("Recommendations for {} (SMS delivery is not available, printing instead).", phone);
    }

    loop {
        let (next, delay) = schedule.delay_until_next(&Local::now());
        info!("Next song at {}.", next.format("%Y-%m-%d %H:%M"));
        tokio::time::sleep(delay).await;

        match pipeline.run(annotator.as_deref()).await {
            Ok(recommendation) => {
                success!("Your song of the day is ready!");
                print_recommendation(&recommendation);
            }
            Err(e)
                if matches!(
                    e.category(),
                    ErrorCategory::Authentication | ErrorCategory::Local
                ) =>
            {
                fail(&e)
            }
            Err(e) => warning!("{}", e.user_message()),
        }
    }
}
