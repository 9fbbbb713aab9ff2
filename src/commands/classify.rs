use anyhow::{Context, Result};

use crate::core::orchestrator::{MetricSource, SysinfoMetricSource, WorkloadClassifier};
use crate::core::Config;
use crate::ui::{format_resources, print_classification};

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    let config = Config::load()?;
    let classifier = WorkloadClassifier::from_config(&config.classifier);

    let result = match matches.get_one::<String>("processes") {
        Some(list) => classifier.classify(list.split(',')),
        None => {
            let mut source = SysinfoMetricSource::new();
            source.refresh();
            if !matches.get_flag("json") {
                if let Some(usage) = source.resource_usage() {
                    println!("{}", format_resources(&usage));
                }
            }
            classifier.classify(source.running_process_names())
        }
    };

    if matches.get_flag("json") {
        let json =
            serde_json::to_string_pretty(&result).context("Failed to encode classification")?;
        println!("{}", json);
    } else {
        print_classification(&result);
    }

    Ok(())
}
