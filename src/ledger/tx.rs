use serde::Deserialize;

/// Substrings in a raw log that mean the transaction did not go through.
pub const FAILURE_MARKERS: [&str; 4] = ["failed", "error", "insufficient", "out of gas"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxOutcome {
    pub hash: String,
    pub raw_log: String,
}

impl TxOutcome {
    pub fn failed(&self) -> bool {
        !self.raw_log.is_empty() && FAILURE_MARKERS.iter().any(|m| self.raw_log.contains(m))
    }
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    txhash: Option<String>,
    #[serde(default)]
    raw_log: Option<String>,
}

/// Extract the hash and raw log from broadcast output.
///
/// JSON on stdout is tried first, then JSON on stderr. Otherwise both streams
/// are scanned line by line for a `txhash:` prefix or a bare 64 character hex
/// token.
pub fn parse_tx_output(stdout: &str, stderr: &str) -> TxOutcome {
    if let Some(outcome) = parse_json(stdout).or_else(|| parse_json(stderr)) {
        return outcome;
    }
    let hash = stdout
        .lines()
        .chain(stderr.lines())
        .map(str::trim)
        .find_map(|line| {
            let prefixed = line
                .get(..7)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("txhash:"));
            if prefixed {
                Some(line[7..].trim().to_string())
            } else if is_hex_hash(line) {
                Some(line.to_string())
            } else {
                None
            }
        })
        .unwrap_or_default();
    TxOutcome {
        hash,
        raw_log: String::new(),
    }
}

fn parse_json(output: &str) -> Option<TxOutcome> {
    // Gas estimates and warnings may surround the JSON body.
    let start = output.find('{')?;
    let response = serde_json::Deserializer::from_str(&output[start..])
        .into_iter::<TxResponse>()
        .next()?
        .ok()?;
    Some(TxOutcome {
        hash: response.txhash.unwrap_or_default(),
        raw_log: response.raw_log.unwrap_or_default(),
    })
}

fn is_hex_hash(line: &str) -> bool {
    line.len() == 64 && line.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "9F86D081884C7D659A2FEAA0C55AD015A3BF4F1B2B0B822CD15D6C15B0F00A08";

    #[test]
    fn parses_json_response() {
        let output = format!(r#"{{"height":"0","txhash":"{HASH}","code":0,"raw_log":""}}"#);
        let outcome = parse_tx_output(&output, "");
        assert_eq!(outcome.hash, HASH);
        assert!(!outcome.failed());
    }

    #[test]
    fn json_raw_log_with_marker_is_a_failure() {
        let output = format!(
            "gas estimate: 120000\n{{\"txhash\":\"{HASH}\",\"raw_log\":\"out of gas in location: WriteFlat\"}}"
        );
        let outcome = parse_tx_output(&output, "");
        assert_eq!(outcome.hash, HASH);
        assert!(outcome.failed());
    }

    #[test]
    fn json_stdout_with_trailing_stderr_keeps_hash() {
        let stdout = format!(r#"{{"txhash":"{HASH}","code":0,"raw_log":""}}"#);
        let outcome = parse_tx_output(&stdout, "gas estimate: 123456\n");
        assert_eq!(outcome.hash, HASH);
        assert!(!outcome.failed());

        let trailing = format!("{stdout}\ngas estimate: 123456");
        assert_eq!(parse_tx_output(&trailing, "").hash, HASH);
    }

    #[test]
    fn hash_on_stderr_is_found() {
        let stderr = format!("gas estimate: 1\ntxhash: {HASH}\n");
        assert_eq!(parse_tx_output("", &stderr).hash, HASH);
    }

    #[test]
    fn falls_back_to_txhash_prefix() {
        let output = format!("code: 0\ncodespace: \"\"\nTxHash: {HASH}\n");
        assert_eq!(parse_tx_output(&output, "").hash, HASH);
    }

    #[test]
    fn falls_back_to_bare_hex_line() {
        let output = format!("broadcasting...\n  {}\n", HASH.to_lowercase());
        assert_eq!(parse_tx_output(&output, "").hash, HASH.to_lowercase());
    }

    #[test]
    fn unparseable_output_yields_empty_hash() {
        let outcome = parse_tx_output("nothing useful here", "");
        assert!(outcome.hash.is_empty());
        assert!(!outcome.failed());
    }
}
