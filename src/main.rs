//! Interactive CLI front-end for the booking wizard.
//!
//! This binary is a stand-in view layer: it reads commands from stdin,
//! translates them into wizard intents, and prints the render state. All
//! business logic lives in the library.

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use tokio::io::{AsyncBufReadExt, BufReader};

use rental_booking::config::WizardConfig;
use rental_booking::draft::{
    AddressType, AgreementKind, ItemKind, ServiceType, SetupOption,
};
use rental_booking::wizard::{BookingWizard, FieldEdit, Intent, RenderState};

const HELP: &str = "\
Commands:
  next | back | check | submit | reset | show | quit
  service dropoff|pickup        date YYYY-MM-DD
  start-time HH:MM              end-date YYYY-MM-DD
  end-time HH:MM                tables N
  chairs N                      name <text>
  phone <text>                  address-type residence|business|park|other
  address <text>                setup none|standard|premium
  agree trash|folding|waiver    sign <text>";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let endpoint = std::env::var("BOOKING_API_URL")
        .unwrap_or_else(|_| WizardConfig::default().endpoint);

    eprintln!("🎪 Rental Booking v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Endpoint: {endpoint}");
    eprintln!("   Type 'help' for commands.\n");

    let config = WizardConfig {
        endpoint,
        ..WizardConfig::default()
    };
    let mut wizard = BookingWizard::from_config(config);

    print_render(&wizard.render());

    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if line == "help" {
            eprintln!("{HELP}");
            eprint!("> ");
            continue;
        }
        if line == "show" {
            print_render(&wizard.render());
            eprint!("> ");
            continue;
        }

        match parse_intent(line) {
            Ok(intent) => {
                let render = wizard.handle(intent).await;
                print_render(&render);
            }
            Err(msg) => eprintln!("⚠️  {msg}"),
        }
        eprint!("> ");
    }

    Ok(())
}

fn parse_intent(line: &str) -> Result<Intent, String> {
    let (cmd, rest) = match line.split_once(' ') {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    let edit = match cmd {
        "next" => return Ok(Intent::NextStep),
        "back" => return Ok(Intent::PrevStep),
        "check" => return Ok(Intent::CheckAvailability),
        "submit" => return Ok(Intent::Submit),
        "reset" => return Ok(Intent::Reset),
        "service" => FieldEdit::ServiceType(match rest {
            "dropoff" => ServiceType::Dropoff,
            "pickup" => ServiceType::Pickup,
            other => return Err(format!("unknown service type: {other}")),
        }),
        "date" => FieldEdit::StartDate(parse_date(rest)?),
        "end-date" => FieldEdit::EndDate(parse_date(rest)?),
        "start-time" => FieldEdit::StartTime(parse_time(rest)?),
        "end-time" => FieldEdit::EndTime(parse_time(rest)?),
        "tables" => FieldEdit::Quantity(ItemKind::Tables, parse_count(rest)?),
        "chairs" => FieldEdit::Quantity(ItemKind::Chairs, parse_count(rest)?),
        "name" => FieldEdit::CustomerName(rest.to_string()),
        "phone" => FieldEdit::Phone(rest.to_string()),
        "address" => FieldEdit::Address(rest.to_string()),
        "address-type" => FieldEdit::AddressType(match rest {
            "residence" => AddressType::Residence,
            "business" => AddressType::Business,
            "park" => AddressType::Park,
            "other" => AddressType::Other,
            other => return Err(format!("unknown address type: {other}")),
        }),
        "setup" => FieldEdit::SetupOption(match rest {
            "none" => SetupOption::None,
            "standard" => SetupOption::Standard,
            "premium" => SetupOption::Premium,
            other => return Err(format!("unknown setup option: {other}")),
        }),
        "agree" => FieldEdit::Agreement(
            match rest {
                "trash" => AgreementKind::Trash,
                "folding" => AgreementKind::Folding,
                "waiver" => AgreementKind::Waiver,
                other => return Err(format!("unknown agreement: {other}")),
            },
            true,
        ),
        "sign" => FieldEdit::Signature(rest.to_string()),
        other => return Err(format!("unknown command: {other} (try 'help')")),
    };
    Ok(Intent::FieldChanged(edit))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("bad date {s:?}: {e}"))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("bad time {s:?}: {e}"))
}

fn parse_count(s: &str) -> Result<u32, String> {
    s.parse().map_err(|_| format!("bad count {s:?}"))
}

fn print_render(render: &RenderState) {
    if let Some(confirmation) = &render.confirmation {
        println!("\n🎉 Booking confirmed! ID: {}", confirmation.booking_id);
        if let Some(date) = &confirmation.date {
            println!("   Date: {date}");
        }
        if let Some(deposit) = &confirmation.deposit {
            println!("   Deposit due: {deposit}");
        }
        println!("   Type 'reset' to book another date.");
        return;
    }

    if let (Some(index), Some(name)) = (render.step_index, render.step_name) {
        println!("\n── Step {index}/{} — {name} ──", render.total_steps);
    }
    if let Some(status) = &render.status {
        println!("{:?}: {}", status.kind, status.text);
    }
    for failure in &render.failures {
        println!("  ✗ {}", failure.message);
    }
    for reason in &render.availability_reasons {
        println!("  • {reason}");
    }
    if let Some(base) = &render.base_quote {
        println!("  Quote: {} → {}", base.items, base.total);
        if let Some(discount) = &base.discount {
            println!("  Discount applied: {discount}");
        }
    }
    if let Some(quote) = &render.final_quote {
        println!(
            "  Add-on: {}  Total: {}  Deposit due: {}",
            quote.add_on_fee, quote.total, quote.deposit
        );
    }
}
