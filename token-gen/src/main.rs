use clap::Parser;
use service_gate::services::token::types::TIMESTAMP_INDEX;
use service_gate::services::token::{TokenCodec, TokenPolicy};
use uuid::Uuid;

/// Generate a `token` header value for the service gate.
///
/// Output is `base64(serviceId|transactionId|epochMillis)`:
/// - transaction id defaults to a random UUID v4
/// - timestamp defaults to now; `--age-seconds` backdates it to produce stale tokens
/// - `--decode` prints the fields of an existing token instead
#[derive(Parser, Debug)]
#[command(name = "token-gen", version, about)]
struct Args {
    /// Service id (must be in the gate's allow-list to pass)
    #[arg(long, required_unless_present = "decode")]
    service_id: Option<String>,

    /// Override the transaction id. Default: random UUID v4.
    #[arg(long)]
    transaction_id: Option<String>,

    /// Override the timestamp (epoch millis). Default: now.
    #[arg(long, conflicts_with = "age_seconds")]
    timestamp_millis: Option<i64>,

    /// Backdate the timestamp by this many seconds.
    #[arg(long)]
    age_seconds: Option<i64>,

    /// Decode an existing token and print its fields.
    #[arg(long, value_name = "TOKEN")]
    decode: Option<String>,

    /// Print only the token (no extra lines)
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

// `now_millis - age_seconds * 1000`, or None when it does not fit in i64.
fn backdate(now_millis: i64, age_seconds: i64) -> Option<i64> {
    age_seconds
        .checked_mul(1000)
        .and_then(|age_millis| now_millis.checked_sub(age_millis))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let codec = TokenCodec::new(TokenPolicy::default());

    if let Some(raw) = args.decode.as_deref() {
        let fields = codec.parse(&codec.decode(raw)?);
        codec.validate_field_count(&fields)?;

        println!("serviceId: {}", codec.service_id(&fields)?);
        println!("transactionId: {}", codec.transaction_id(&fields)?);
        println!("timestampMillis: {}", fields[TIMESTAMP_INDEX]);
        return Ok(());
    }

    let service_id = args.service_id.ok_or("--service-id is required")?;
    let transaction_id = args
        .transaction_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let timestamp_millis = match args.timestamp_millis {
        Some(ts) => ts,
        None => backdate(
            chrono::Utc::now().timestamp_millis(),
            args.age_seconds.unwrap_or(0),
        )
        .ok_or("--age-seconds is out of range")?,
    };

    let token = codec.encode(&service_id, &transaction_id, timestamp_millis)?;

    if args.quiet {
        println!("{}", token);
        return Ok(());
    }

    println!("token: {}", token);
    println!("serviceId: {}", service_id);
    println!("transactionId: {}", transaction_id);
    println!("timestampMillis: {}", timestamp_millis);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backdate_subtracts_seconds_as_millis() {
        assert_eq!(backdate(1_000_000, 0), Some(1_000_000));
        assert_eq!(backdate(1_000_000, 60), Some(940_000));
        assert_eq!(backdate(1_000_000, -5), Some(1_005_000));
    }

    #[test]
    fn backdate_reports_overflow_instead_of_wrapping() {
        assert_eq!(backdate(1_000_000, i64::MAX), None);
        assert_eq!(backdate(i64::MIN, 1), None);
        assert_eq!(backdate(0, i64::MIN / 1000 - 1), None);
    }
}
