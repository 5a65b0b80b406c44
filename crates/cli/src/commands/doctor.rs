//! `panepilot doctor` — Diagnose environment and provider health.

use panepilot_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("PanePilot Doctor — Diagnostics");
    println!("==============================\n");

    let mut issues = 0;

    // Ambient tmux session
    let inside_tmux = std::env::var("TMUX").map(|v| !v.is_empty()).unwrap_or(false);
    if inside_tmux {
        println!("  [ok] Running inside a tmux session");
    } else {
        println!("  [!!] Not inside tmux — `panepilot chat` will refuse to start");
        issues += 1;
    }

    // tmux binary
    match tokio::process::Command::new("tmux").arg("-V").output().await {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            println!("  [ok] tmux binary found ({version})");
        }
        _ => {
            println!("  [!!] tmux binary not found on PATH");
            issues += 1;
        }
    }

    // Config
    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  [ok] Config valid");
            Some(config)
        }
        Err(e) => {
            println!("  [!!] Config invalid: {e}");
            issues += 1;
            None
        }
    };

    if let Some(config) = config {
        if config.has_api_key() {
            println!("  [ok] API key configured");

            // Provider reachability and model availability
            let provider = panepilot_providers::build_from_config(&config);
            match provider.health_check().await {
                Ok(true) => {
                    println!("  [ok] Provider reachable at {}", config.base_url);

                    match provider.list_models().await {
                        Ok(models) if models.iter().any(|m| m == &config.model) => {
                            println!("  [ok] Model '{}' available", config.model);
                        }
                        Ok(_) => {
                            println!(
                                "  [!!] Model '{}' not listed by the provider",
                                config.model
                            );
                            issues += 1;
                        }
                        Err(e) => {
                            println!("  [!!] Could not list models: {e}");
                            issues += 1;
                        }
                    }
                }
                Ok(false) | Err(_) => {
                    println!("  [!!] Provider not reachable at {}", config.base_url);
                    issues += 1;
                }
            }
        } else {
            println!("  [!!] No API key — set PANEPILOT_API_KEY or add api_key to config.toml");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
