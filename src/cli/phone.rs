use crate::{
    cli::{Context, fail},
    info, success,
    types::PhoneNumber,
    warning,
};

/// Stores the phone number for daily delivery, or shows the stored one.
pub async fn phone(ctx: &Context, number: Option<String>) {
    let Some(number) = number else {
        match ctx.tokens.phone_number().await {
            Ok(Some(stored)) => info!("Daily songs go to {}.", stored),
            Ok(None) => warning!("No phone number saved. Run `dailysong phone <number>`."),
            Err(e) => fail(&e),
        }
        return;
    };

    let phone = match PhoneNumber::parse(&number) {
        Ok(p) => p,
        Err(e) => fail(&e),
    };

    match ctx.tokens.save_phone_number(&phone).await {
        Ok(()) => success!(
            "Phone number saved. You'll get a new song every day at {} (see `dailysong daily`).",
            ctx.config.daily_at.format("%H:%M")
        ),
        Err(e) => fail(&e),
    }
}
