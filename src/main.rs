use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use flowboard::controller::{Controller, UiEvent};
use flowboard::data::{build_manifest, parse_centroids, parse_flows, CENTROID_COLUMNS, FLOW_COLUMNS};
use flowboard::feed;
use flowboard::logging::{log, obj, v_num, v_str, Domain, Level};
use flowboard::render::RenderOutput;
use flowboard::state::Config;
use flowboard::storage::PrefStore;

fn write_artifacts(out_dir: &str, output: &RenderOutput) -> Result<()> {
    let dir = Path::new(out_dir);
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", out_dir))?;
    fs::write(dir.join("bar.json"), serde_json::to_string_pretty(&output.bar)?)?;
    fs::write(dir.join("line.json"), serde_json::to_string_pretty(&output.line)?)?;
    fs::write(dir.join("map.json"), serde_json::to_string_pretty(&output.map)?)?;
    fs::write(
        dir.join("panel.json"),
        serde_json::to_string_pretty(&json!({
            "titles": output.titles,
            "focus": output.focus,
        }))?,
    )?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("flows", v_str(&cfg.flows_source)),
            ("centroids", v_str(&cfg.centroids_source)),
            ("out_dir", v_str(&cfg.out_dir)),
        ]),
    );

    // Two sequential fetches, no retry: any failure is terminal and
    // reported exactly once.
    let datasets = match feed::load_datasets(&cfg).await {
        Ok(d) => d,
        Err(err) => {
            log(
                Level::Error,
                Domain::System,
                "load_failed",
                obj(&[("error", v_str(&format!("{:#}", err)))]),
            );
            eprintln!("Failed to load datasets: {:#}", err);
            return Err(err);
        }
    };

    let (centroids, centroid_report) =
        parse_centroids(&datasets.centroids_csv).map_err(anyhow::Error::msg)?;
    let (flows, flow_report) = parse_flows(&datasets.flows_csv).map_err(anyhow::Error::msg)?;

    for (source, csv, report, columns) in [
        (
            &cfg.centroids_source,
            &datasets.centroids_csv,
            &centroid_report,
            &CENTROID_COLUMNS[..],
        ),
        (&cfg.flows_source, &datasets.flows_csv, &flow_report, &FLOW_COLUMNS[..]),
    ] {
        let manifest = build_manifest(source, csv, report, columns);
        log(
            Level::Info,
            Domain::Data,
            "dataset_loaded",
            obj(&[
                ("source", v_str(&manifest.source)),
                ("hash", v_str(&manifest.hash_sha256)),
                ("rows", v_num(manifest.rows as f64)),
                ("bad_rows", v_num(manifest.bad_rows as f64)),
            ]),
        );
    }

    let mut store = PrefStore::new(&cfg.sqlite_path)?;
    store.init()?;

    let mut controller = Controller::new(flows, centroids, &cfg, store)?;
    let output = controller.render();
    write_artifacts(&cfg.out_dir, &output)?;

    if cfg.interactive {
        // Each stdin line is one UI control change; the pipeline re-runs
        // and the artifacts are replaced wholesale.
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed == "quit" {
                break;
            }
            match UiEvent::parse(trimmed) {
                Ok(event) => {
                    let output = controller.handle(event)?;
                    write_artifacts(&cfg.out_dir, &output)?;
                }
                Err(err) => {
                    log(
                        Level::Warn,
                        Domain::Control,
                        "bad_command",
                        obj(&[("input", v_str(trimmed)), ("error", v_str(&err))]),
                    );
                }
            }
        }
    }

    log(Level::Info, Domain::System, "shutdown", obj(&[]));
    Ok(())
}
