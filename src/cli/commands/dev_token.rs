use serde_json::json;

use crate::auth::dev_token;
use crate::cli::commands::health::DEFAULT_SERVER_URL;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

pub fn handle(user_id: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let (token, user_id) = dev_token::generate(user_id.as_deref());
    let curl = format!(
        "curl -H \"Authorization: Bearer {}\" {}/api/budgets/{}",
        token, DEFAULT_SERVER_URL, user_id
    );

    if dev_token::parse(&token).is_none() {
        tracing::warn!("Token {} is too short to be accepted as a development token", token);
    }

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Development token (not for production)",
            Some(json!({
                "user_id": user_id,
                "token": token,
                "authorization": format!("Bearer {}", token),
                "example": curl,
            })),
        ),
        OutputFormat::Text => {
            println!();
            println!("=== DEVELOPMENT TOKEN (NOT FOR PRODUCTION) ===");
            println!("User ID: {}", user_id);
            println!("Token: {}", token);
            println!();
            println!("Use this in your Authorization header as:");
            println!("Bearer {}", token);
            println!();
            println!("Example curl command:");
            println!("{}", curl);
            println!("==============================================");
            println!();
            Ok(())
        }
    }
}
