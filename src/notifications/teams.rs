//! Microsoft Teams connector webhook delivery

use crate::card::MessageCard;
use crate::error::{NotifyError, Result};

/// Post the card to the webhook, once.
///
/// Transport failures and non-2xx answers are both fatal; nothing is retried.
pub async fn send_teams_card(
    client: &reqwest::Client,
    webhook: &str,
    card: &MessageCard,
) -> Result<()> {
    let payload = serde_json::to_vec(card)?;
    tracing::debug!(payload = %String::from_utf8_lossy(&payload), "Posting card");

    let response = client
        .post(webhook)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(payload)
        .send()
        .await
        .map_err(|e| {
            tracing::error!("Failed to send request to teams webhook: {}", e);
            NotifyError::Delivery(e)
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(%status, "Teams webhook rejected the card");
        return Err(NotifyError::Rejected { status, body });
    }

    tracing::info!("Card delivered");
    Ok(())
}
