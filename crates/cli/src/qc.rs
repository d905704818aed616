//! QC sweep against a running consent-sync server.
//!
//! Calls `GET /transfer?record=<id>` for each id in a range and classifies the answer from the
//! status code and the rendered page.

use std::time::Duration;

/// Pause between consecutive requests.
pub const QC_PAUSE: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QcVerdict {
    Electronic,
    InPerson,
    Synced,
    NotFound,
    MissingId,
    Error(u16),
    Connection(String),
}

impl QcVerdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Electronic | Self::InPerson | Self::Synced)
    }
}

impl std::fmt::Display for QcVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Electronic => write!(f, "SUCCESS [Electronic Consent]"),
            Self::InPerson => write!(f, "SUCCESS [In-Person Consent]"),
            Self::Synced => write!(f, "SUCCESS [Synced]"),
            Self::NotFound => write!(f, "FAILED | Record not found in source project."),
            Self::MissingId => write!(f, "FAILED | Missing Record ID."),
            Self::Error(status) => write!(f, "ERROR | Status: {status}"),
            Self::Connection(reason) => {
                write!(f, "CONNECTION ERROR | Is the server running?: {reason}")
            }
        }
    }
}

/// Classify one `/transfer` response.
pub fn classify(status: u16, body: &str) -> QcVerdict {
    match status {
        200 if body.contains("Electronic Consent") => QcVerdict::Electronic,
        200 if body.contains("In-Person Consent") => QcVerdict::InPerson,
        200 => QcVerdict::Synced,
        404 => QcVerdict::NotFound,
        400 => QcVerdict::MissingId,
        other => QcVerdict::Error(other),
    }
}

/// Run the sweep over `from..=to`, printing one line per record.
///
/// Returns the verdicts in request order.
pub async fn run(server: &str, from: u32, to: u32) -> Vec<(String, QcVerdict)> {
    let http = reqwest::Client::new();
    let url = format!("{}/transfer", server.trim_end_matches('/'));
    let mut verdicts = Vec::new();

    println!("---STARTING QC BATCH TEST---");
    println!("{}", "-".repeat(50));

    for record_id in (from..=to).map(|id| id.to_string()) {
        let verdict = match http
            .get(&url)
            .query(&[("record", record_id.as_str())])
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                classify(status, &body)
            }
            Err(e) => QcVerdict::Connection(e.to_string()),
        };

        println!("Testing Record {record_id}: {verdict}");
        verdicts.push((record_id, verdict));
        tokio::time::sleep(QC_PAUSE).await;
    }

    println!("{}", "-".repeat(50));
    println!("Batch Test Complete. Check the server log for sync events.");
    verdicts
}
