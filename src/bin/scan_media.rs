use anyhow::{anyhow, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use veridect::api::{
    clear_history, download_model, list_history, run_scan, test_model, train_model, AppStores,
};
use veridect::models::{ContentType, DetectionResult, ScanRequest};
use veridect::services::detection::pipeline::CancelFlag;
use veridect::services::media_probe::infer_content_type;
use veridect::services::model_store::UserRole;

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

fn usage() {
    eprintln!(
        "Usage:\n  scan_media <path> [--type image|video|audio|text] [--fast] \
         [--width <px>] [--height <px>] [--duration <secs>] [--out <json_path>]\n  \
         scan_media --text \"<snippet>\" [--fast] [--out <json_path>]\n  \
         scan_media --history | --clear-history\n  \
         scan_media --train <ds1,ds2,...> --type <t>\n  \
         scan_media --download <version> --type <t>\n  \
         scan_media --test-model --type <t>\n\nNotes:\n  \
         - Without --type the content type is inferred from the file extension.\n  \
         - Maintenance flags accept --data-dir / --config-dir to relocate the stores."
    );
}

fn open_stores(args: &[String]) -> Result<AppStores> {
    let data_dir = parse_arg_value(args, "--data-dir");
    let config_dir = parse_arg_value(args, "--config-dir");
    match (config_dir, data_dir) {
        (Some(c), Some(d)) => Ok(AppStores::open_at(Path::new(&c), Path::new(&d))),
        (None, Some(d)) => Ok(AppStores::open_at(Path::new(&d), Path::new(&d))),
        (Some(c), None) => Ok(AppStores::open_at(Path::new(&c), Path::new(&c))),
        (None, None) => AppStores::open_default().map_err(anyhow::Error::msg),
    }
}

fn required_type(args: &[String]) -> Result<ContentType> {
    let raw = parse_arg_value(args, "--type")
        .ok_or_else(|| anyhow!("--type is required for this operation"))?;
    ContentType::parse(&raw).ok_or_else(|| anyhow!("unknown content type: {}", raw))
}

fn print_result(result: &DetectionResult) {
    println!();
    if result.is_manipulated {
        println!(
            "Verdict: MANIPULATED ({:.1}% confidence)",
            result.confidence_score
        );
    } else {
        println!(
            "Verdict: authentic ({:.1}% confidence)",
            result.confidence_score
        );
    }
    if let Some(human) = result.human_score {
        println!("Human-written likelihood: {:.1}%", human);
    }
    println!("{}", result.details_text);
    if !result.issues.is_empty() {
        println!();
        println!("Findings:");
        for issue in &result.issues {
            println!("  - {}", issue);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    veridect::init_logging();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage();
        return Ok(());
    }

    let stores = open_stores(&args)?;

    if has_flag(&args, "--history") {
        let items = list_history(&stores).map_err(anyhow::Error::msg)?;
        println!("History: {} item(s)", items.len());
        for item in items {
            let label = item
                .filename
                .or(item.text_snippet.map(|s| preview(&s, 40)))
                .unwrap_or_else(|| "(unnamed)".to_string());
            println!(
                "[{}] {} {:<5} {} ({:.1}%)",
                item.date.format("%Y-%m-%d %H:%M"),
                item.content_type.as_str(),
                if item.manipulated { "FAKE" } else { "ok" },
                label,
                item.confidence_score
            );
        }
        return Ok(());
    }

    if has_flag(&args, "--clear-history") {
        clear_history(&stores).map_err(anyhow::Error::msg)?;
        println!("History cleared");
        return Ok(());
    }

    if let Some(datasets) = parse_arg_value(&args, "--train") {
        let content_type = required_type(&args)?;
        let datasets: Vec<String> = datasets
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let record = train_model(&stores, content_type, &datasets, UserRole::Admin)
            .await
            .map_err(anyhow::Error::msg)?;
        println!(
            "Trained {} model -> {} (accuracy {:.2})",
            content_type.as_str(),
            record.model_version,
            record.accuracy_after
        );
        return Ok(());
    }

    if let Some(version) = parse_arg_value(&args, "--download") {
        let content_type = required_type(&args)?;
        let state =
            download_model(&stores, content_type, &version, UserRole::Admin)
                .map_err(anyhow::Error::msg)?;
        println!(
            "Installed {} for {} (accuracy {:.2})",
            state.model_version,
            content_type.as_str(),
            state.accuracy
        );
        return Ok(());
    }

    if has_flag(&args, "--test-model") {
        let content_type = required_type(&args)?;
        let report = test_model(&stores, content_type).map_err(anyhow::Error::msg)?;
        println!(
            "Evaluation on {} samples: accuracy {:.2}, precision {:.2}, recall {:.2}",
            report.sample_count, report.accuracy, report.precision, report.recall
        );
        return Ok(());
    }

    // Scan path: a file argument or an inline --text snippet.
    let text = parse_arg_value(&args, "--text");
    let path = if text.is_none() && !args[1].starts_with("--") {
        Some(args[1].clone())
    } else {
        None
    };

    let content_type = match parse_arg_value(&args, "--type") {
        Some(raw) => {
            ContentType::parse(&raw).ok_or_else(|| anyhow!("unknown content type: {}", raw))?
        }
        None if text.is_some() => ContentType::Text,
        None => {
            let p = path.as_deref().ok_or_else(|| {
                usage();
                anyhow!("nothing to scan")
            })?;
            infer_content_type(Path::new(p))
                .ok_or_else(|| anyhow!("cannot infer content type of {}; pass --type", p))?
        }
    };

    let request = ScanRequest {
        content_type,
        path: path.clone(),
        text,
        declared_width: parse_arg_value(&args, "--width").and_then(|v| v.parse().ok()),
        declared_height: parse_arg_value(&args, "--height").and_then(|v| v.parse().ok()),
        declared_duration_secs: parse_arg_value(&args, "--duration").and_then(|v| v.parse().ok()),
        fast: has_flag(&args, "--fast"),
    };

    println!(
        "Scanning {} as {}...",
        path.as_deref().unwrap_or("(inline text)"),
        content_type.as_str()
    );

    let result = run_scan(
        &stores,
        &request,
        |pct| {
            print!("\rAnalyzing... {:>3.0}%", pct);
            let _ = std::io::stdout().flush();
        },
        &CancelFlag::new(),
    )
    .await
    .map_err(anyhow::Error::msg)?;
    println!();

    print_result(&result);

    if let Some(out_path) = parse_arg_value(&args, "--out") {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Output {
            content_type: ContentType,
            file: Option<String>,
            result: DetectionResult,
        }

        let out = Output {
            content_type,
            file: path,
            result,
        };
        let json = serde_json::to_string_pretty(&out)?;
        std::fs::write(&out_path, json)?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
