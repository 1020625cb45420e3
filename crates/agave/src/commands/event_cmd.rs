//! Event subcommand handlers: build an event exactly as a sensor would and
//! print it instead of publishing it.

use agave_core::{AttackEvent, InboundRequest, Sensor};

use crate::cli::{EventArgs, EventCommand, GlobalOpts, HttpEventArgs};
use crate::commands::load_existing;
use crate::error::CliError;

pub async fn handle(args: EventArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = load_existing(global)?;
    let sensor = Sensor::new(cfg.sensor_config()?);

    let event: AttackEvent = match args.command {
        EventCommand::Http(http) => {
            for ip in &http.seen {
                sensor.save_ip(ip);
            }
            let signature = http.signature.clone();
            let request = build_request(http)?;
            sensor.http_attack(signature, request).await?.into()
        }
        EventCommand::Credentials(creds) => {
            let request = InboundRequest::new(creds.remote, "POST", "/");
            sensor
                .credential_attack(&request, creds.username, creds.password)?
                .into()
        }
    };

    tracing::info!(kind = event.kind(), src = event.src_ip(), "event built");

    let json = if args.compact {
        serde_json::to_string(&event)?
    } else {
        serde_json::to_string_pretty(&event)?
    };
    println!("{json}");
    Ok(())
}

fn build_request(args: HttpEventArgs) -> Result<InboundRequest, CliError> {
    let mut request = InboundRequest::new(args.remote, args.method, args.target);

    for raw in &args.headers {
        let (name, value) = raw.split_once(':').ok_or_else(|| CliError::Validation {
            field: "header".into(),
            reason: format!("expected \"Name: value\", got '{raw}'"),
        })?;
        request = request.with_header(name.trim(), value.trim());
    }

    let host = args
        .host
        .or_else(|| request.header("Host").map(str::to_owned))
        .unwrap_or_default();
    request = request.with_host(host);

    if let Some(body) = args.body {
        request = request.with_body(body);
    }
    Ok(request)
}
