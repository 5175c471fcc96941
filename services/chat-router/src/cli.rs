//! Command-line client that talks to a running hub over the HTTP
//! adapter. Mode selection happens in `main`: if argv[1] names one of
//! the commands handled here, the process runs as a CLI and exits;
//! otherwise it starts the daemon.

use std::collections::HashMap;
use std::io::Read;
use std::process::ExitCode;

const KNOWN_COMMANDS: &[&str] = &["health", "conversations", "timeline", "ingest", "respond"];

pub fn is_cli_invocation(args: &[String]) -> bool {
    args.first()
        .map(|a| KNOWN_COMMANDS.contains(&a.as_str()))
        .unwrap_or(false)
}

/// Parsed argv: positionals in order, then `--key value` flags.
struct ParsedArgs {
    positionals: Vec<String>,
    flags: HashMap<String, String>,
}

fn parse_args(args: &[String]) -> ParsedArgs {
    let mut positionals = Vec::new();
    let mut flags = HashMap::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(key) = arg.strip_prefix("--") {
            let value = iter.next().cloned().unwrap_or_default();
            flags.insert(key.to_string(), value);
        } else {
            positionals.push(arg.clone());
        }
    }
    ParsedArgs { positionals, flags }
}

pub async fn run(router_url: &str, args: &[String]) -> ExitCode {
    let command = &args[0];
    let parsed = parse_args(&args[1..]);
    let client = reqwest::Client::new();

    let result = match command.as_str() {
        "health" => health(&client, router_url).await,
        "conversations" => conversations(&client, router_url, &parsed).await,
        "timeline" => timeline(&client, router_url, &parsed).await,
        "ingest" => ingest(&client, router_url, &parsed).await,
        "respond" => respond(&client, router_url, &parsed).await,
        other => Err(format!("unknown command: {other}")),
    };

    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value).unwrap());
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

type CliResult = Result<serde_json::Value, String>;

async fn health(client: &reqwest::Client, base: &str) -> CliResult {
    get_json(client, &format!("{base}/api/health")).await
}

async fn conversations(client: &reqwest::Client, base: &str, args: &ParsedArgs) -> CliResult {
    let mut url = format!("{base}/api/conversations?");
    if let Some(platform) = args.flags.get("platform") {
        url.push_str(&format!("platform={platform}&"));
    }
    if let Some(limit) = args.flags.get("limit") {
        url.push_str(&format!("limit={limit}&"));
    }
    get_json(client, &url).await
}

async fn timeline(client: &reqwest::Client, base: &str, args: &ParsedArgs) -> CliResult {
    let mut url = match (args.positionals.first(), args.positionals.get(1)) {
        (Some(platform), Some(chat_id)) => {
            format!("{base}/api/timeline/{platform}/{chat_id}?")
        }
        _ => format!("{base}/api/timeline?"),
    };
    for key in ["after", "before", "limit"] {
        if let Some(value) = args.flags.get(key) {
            url.push_str(&format!("{key}={value}&"));
        }
    }
    get_json(client, &url).await
}

async fn ingest(client: &reqwest::Client, base: &str, args: &ParsedArgs) -> CliResult {
    let body = read_body(args)?;
    post_json(client, &format!("{base}/api/messages"), body).await
}

async fn respond(client: &reqwest::Client, base: &str, args: &ParsedArgs) -> CliResult {
    let body = read_body(args)?;
    post_json(client, &format!("{base}/api/responses"), body).await
}

fn read_body(args: &ParsedArgs) -> Result<serde_json::Value, String> {
    let raw = if let Some(json) = args.flags.get("json") {
        json.clone()
    } else {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        buf
    };
    serde_json::from_str(&raw).map_err(|e| format!("invalid JSON body: {e}"))
}

async fn get_json(client: &reqwest::Client, url: &str) -> CliResult {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;
    parse_response(response).await
}

async fn post_json(
    client: &reqwest::Client,
    url: &str,
    body: serde_json::Value,
) -> CliResult {
    let response = client
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;
    parse_response(response).await
}

async fn parse_response(response: reqwest::Response) -> CliResult {
    let status = response.status();
    let value: serde_json::Value = response
        .json()
        .await
        .map_err(|e| format!("failed to parse response body: {e}"))?;
    if status.is_success() {
        Ok(value)
    } else {
        let message = value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("request failed");
        Err(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_commands_as_cli_invocations() {
        assert!(is_cli_invocation(&["health".to_string()]));
        assert!(is_cli_invocation(&["ingest".to_string(), "--json".to_string(), "{}".to_string()]));
    }

    #[test]
    fn unknown_first_argument_is_not_a_cli_invocation() {
        assert!(!is_cli_invocation(&[]));
        assert!(!is_cli_invocation(&["--daemon".to_string()]));
    }

    #[test]
    fn parse_args_splits_positionals_and_flags() {
        let args = vec![
            "telegram".to_string(),
            "c1".to_string(),
            "--limit".to_string(),
            "10".to_string(),
        ];
        let parsed = parse_args(&args);
        assert_eq!(parsed.positionals, vec!["telegram", "c1"]);
        assert_eq!(parsed.flags.get("limit"), Some(&"10".to_string()));
    }
}
