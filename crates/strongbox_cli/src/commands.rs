//! Command implementations.

use crate::Commands;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use strongbox_core::{Ack, CategoryCounts, CoreResult, EntryList, Envelope, Wallet};

/// Runs one command, returning whether it succeeded and its envelope.
pub(crate) fn run(wallet: &Wallet, key: &str, command: Commands) -> (bool, String) {
    match command {
        Commands::Provision => respond(wallet.provision(key).map(|()| Ack {})),
        Commands::Insert {
            name,
            value,
            category,
            tags,
        } => {
            let category = category.unwrap_or_else(|| wallet.config().default_category.clone());
            let tags = tags.into_iter().collect();
            respond(
                wallet
                    .insert_entry(key, &category, &name, &value, tags)
                    .map(|()| Ack {}),
            )
        }
        Commands::List => respond(wallet.entries(key).map(|entries| EntryList { entries })),
        Commands::Import { file } => {
            respond(read_batch(&file).and_then(|batch| wallet.import(key, &batch)))
        }
        Commands::Categories => respond(
            wallet
                .categories(key)
                .map(|categories| CategoryCounts { categories }),
        ),
    }
}

fn respond<T: Serialize>(result: CoreResult<T>) -> (bool, String) {
    let envelope = Envelope::from(result);
    (envelope.is_success(), envelope.encode())
}

fn read_batch(file: &Path) -> CoreResult<String> {
    let mut batch = String::new();
    if file == Path::new("-") {
        std::io::stdin().read_to_string(&mut batch)?;
    } else {
        batch = std::fs::read_to_string(file)?;
    }
    Ok(batch)
}

/// Parses a `KEY=VALUE` tag argument. The value may be empty or contain `=`.
pub(crate) fn parse_tag(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid tag '{arg}', expected KEY=VALUE")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn parse(envelope: &str) -> Value {
        serde_json::from_str(envelope).unwrap()
    }

    #[test]
    fn tag_arguments() {
        assert_eq!(parse_tag("env=prod").unwrap(), ("env".into(), "prod".into()));
        assert_eq!(parse_tag("expr=a=b").unwrap(), ("expr".into(), "a=b".into()));
        assert_eq!(parse_tag("flag=").unwrap(), ("flag".into(), String::new()));
        assert!(parse_tag("=x").is_err());
        assert!(parse_tag("novalue").is_err());
    }

    #[test]
    fn commands_print_envelopes() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = Wallet::at(dir.path().join("w.db"));

        assert_eq!(run(&wallet, "K1", Commands::Provision), (true, r#"{"success":true}"#.into()));

        let insert = Commands::Insert {
            name: "did:sov:1".into(),
            value: "v".into(),
            category: Some("did".into()),
            tags: vec![("method".into(), "sov".into())],
        };
        assert!(run(&wallet, "K1", insert).0);

        let (ok, listing) = run(&wallet, "K1", Commands::List);
        assert!(ok);
        assert_eq!(
            parse(&listing),
            json!({
                "success": true,
                "entries": [{"category": "did", "name": "did:sov:1", "value": "v", "tags": {"method": "sov"}}]
            })
        );

        let batch = dir.path().join("batch.json");
        std::fs::write(&batch, r#"{"general": [{"name": "user1", "value": "x"}]}"#).unwrap();
        let (ok, imported) = run(&wallet, "K1", Commands::Import { file: batch });
        assert!(ok);
        assert_eq!(parse(&imported)["imported"], 1);

        let (_, categories) = run(&wallet, "K1", Commands::Categories);
        assert_eq!(
            parse(&categories),
            json!({"success": true, "categories": {"did": 1, "general": 1}})
        );
    }

    #[test]
    fn failures_report_unsuccessful() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = Wallet::at(dir.path().join("w.db"));
        run(&wallet, "K1", Commands::Provision);

        let (ok, envelope) = run(&wallet, "K2", Commands::List);
        assert!(!ok);
        assert_eq!(parse(&envelope)["success"], false);

        let missing = Commands::Import {
            file: dir.path().join("missing.json"),
        };
        let (ok, envelope) = run(&wallet, "K1", missing);
        assert!(!ok);
        assert!(parse(&envelope)["error"].is_string());
    }
}
