//! Basic OpenAI image generation example

use openai_client::{ImageRequest, OpenAIClient, DALL_E_3};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize from environment
    let client = OpenAIClient::from_env()?;

    println!("=== Image Generation ===");
    let image = client
        .generate_image(ImageRequest::new(DALL_E_3, "A red balloon over a quiet harbor").size("1024x1024"))
        .await?;

    println!("Base64 payload: {} bytes", image.b64_json.len());
    if let Some(revised) = image.revised_prompt {
        println!("Revised prompt: {}", revised);
    }

    Ok(())
}
