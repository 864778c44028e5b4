use std::io::{Read, Write};

use stitch_api::{build_message_batches, build_schema, package, BatchPayload};
use stitch_client::{ClientConfig, ImportClient};

use super::config::Effective;
use super::error::PushError;

// ═══════════════════════════════════════════════════════════════
//  Main dispatch
// ═══════════════════════════════════════════════════════════════

pub async fn run(eff: &Effective) -> Result<(), PushError> {
    let input = read_input(&eff.input)?;
    let payloads = build_payloads(eff, &input)?;

    tracing::info!(
        table = %eff.table_name,
        sequence = eff.sequence,
        batches = payloads.len(),
        records = payloads.iter().map(|p| p.messages.len()).sum::<usize>(),
        "input batched"
    );

    if eff.dry_run {
        let mut out = std::io::BufWriter::new(std::io::stdout().lock());
        return write_payloads(&payloads, &mut out);
    }

    let token = eff
        .token
        .clone()
        .ok_or_else(|| PushError::Config("API token is required".into()))?;
    let client = ImportClient::new(
        ClientConfig::new(token)
            .with_base_url(eff.base_url.clone())
            .with_timeout(eff.timeout),
    )?;

    let receipts = client.send_all(&payloads).await?;
    for (i, receipt) in receipts.iter().enumerate() {
        let response = receipt.body.get("message").map(String::as_str).unwrap_or("");
        tracing::info!(batch = i, status = receipt.status, response, "receipt");
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
//  Helpers
// ═══════════════════════════════════════════════════════════════

fn read_input(path: &str) -> Result<Vec<u8>, PushError> {
    let mut buf = Vec::new();
    let res = if path == "-" {
        std::io::stdin().lock().read_to_end(&mut buf).map(|_| ())
    } else {
        std::fs::File::open(path).and_then(|mut f| f.read_to_end(&mut buf)).map(|_| ())
    };
    res.map_err(|source| PushError::Input { path: path.to_string(), source })?;
    Ok(buf)
}

pub fn build_payloads(eff: &Effective, input: &[u8]) -> Result<Vec<BatchPayload>, PushError> {
    let batches = build_message_batches(input, eff.sequence, eff.limits)?;
    let schema = build_schema(&eff.schema);
    Ok(package(batches, &eff.table_name, &schema, &eff.key_names))
}

/// One JSON payload per line.
pub fn write_payloads(payloads: &[BatchPayload], out: &mut impl Write) -> Result<(), PushError> {
    for payload in payloads {
        out.write_all(&payload.to_json()?).map_err(PushError::Output)?;
        out.write_all(b"\n").map_err(PushError::Output)?;
    }
    out.flush().map_err(PushError::Output)
}
