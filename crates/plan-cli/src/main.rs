use std::collections::HashMap;
use std::error::Error;
use std::fs;

use plan_core::{RoomVolume, Style, compute_metrics, plan_layout};
use serde_json::json;

type DynError = Box<dyn Error>;
type Flags = HashMap<String, String>;

fn main() -> Result<(), DynError> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        print_usage();
        return Ok(());
    }

    match args[0].as_str() {
        "compute-metrics" => run_compute_metrics(&args[1..]),
        "plan-layout" => run_plan_layout(&args[1..]),
        "export-layout" => run_export_layout(&args[1..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn run_compute_metrics(args: &[String]) -> Result<(), DynError> {
    let flags = parse_flags(args)?;
    let length = required_f64(&flags, "--length")?;
    let width = required_f64(&flags, "--width")?;
    let open_area = optional_f64(&flags, "--open-area", 0.0)?;

    let metrics = compute_metrics(length, width, open_area);
    println!("total_area {:.17}", metrics.total_area);
    println!("built_up_area {:.17}", metrics.built_up_area);
    println!("open_area {:.17}", metrics.open_area);
    println!("open_percentage {:.17}", metrics.open_percentage);
    println!("is_valid {}", metrics.is_valid);
    Ok(())
}

fn run_plan_layout(args: &[String]) -> Result<(), DynError> {
    let flags = parse_flags(args)?;
    for room in build_layout(&flags)? {
        println!(
            "{} center {:.17} {:.17} {:.17} size {:.17} {:.17} {:.17} color {}",
            room.label,
            room.position[0],
            room.position[1],
            room.position[2],
            room.size[0],
            room.size[1],
            room.size[2],
            room.color,
        );
    }
    Ok(())
}

fn run_export_layout(args: &[String]) -> Result<(), DynError> {
    let flags = parse_flags(args)?;
    let rooms = build_layout(&flags)?;
    let output = required_str(&flags, "--output")?;

    let text = serde_json::to_string_pretty(&layout_json(&rooms))?;
    fs::write(output, text)?;
    Ok(())
}

fn build_layout(flags: &Flags) -> Result<Vec<RoomVolume>, DynError> {
    let length = required_f64(flags, "--length")?;
    let width = required_f64(flags, "--width")?;
    let rooms = required_u32(flags, "--rooms")?;
    let style = Style::from_name(optional_str(flags, "--style", "modern"));
    Ok(plan_layout(length, width, rooms, style))
}

fn layout_json(rooms: &[RoomVolume]) -> serde_json::Value {
    json!({
        "rooms": rooms
            .iter()
            .map(|room| {
                json!({
                    "label": room.label,
                    "position": room.position,
                    "size": room.size,
                    "color": room.color,
                })
            })
            .collect::<Vec<_>>(),
    })
}

fn parse_flags(args: &[String]) -> Result<Flags, DynError> {
    if !args.len().is_multiple_of(2) {
        return Err("expected flag-value pairs".into());
    }

    let mut flags = HashMap::new();
    let mut index = 0;
    while index < args.len() {
        let flag = args[index].as_str();
        if !flag.starts_with("--") {
            return Err(format!("expected flag at position {}", index + 1).into());
        }
        let value = args[index + 1].clone();
        if flags.insert(flag.to_string(), value).is_some() {
            return Err(format!("duplicate flag: {flag}").into());
        }
        index += 2;
    }
    Ok(flags)
}

fn required_str<'a>(flags: &'a Flags, key: &str) -> Result<&'a str, DynError> {
    flags
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| format!("missing required {key}").into())
}

fn required_f64(flags: &Flags, key: &str) -> Result<f64, DynError> {
    required_str(flags, key)?
        .parse::<f64>()
        .map_err(|err| format!("invalid float for {key}: {err}").into())
}

fn required_u32(flags: &Flags, key: &str) -> Result<u32, DynError> {
    required_str(flags, key)?
        .parse::<u32>()
        .map_err(|err| format!("invalid count for {key}: {err}").into())
}

fn optional_f64(flags: &Flags, key: &str, default: f64) -> Result<f64, DynError> {
    match flags.get(key) {
        Some(value) => value
            .parse::<f64>()
            .map_err(|err| format!("invalid float for {key}: {err}").into()),
        None => Ok(default),
    }
}

fn optional_str<'a>(flags: &'a Flags, key: &str, default: &'a str) -> &'a str {
    flags.get(key).map(String::as_str).unwrap_or(default)
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  plan-cli compute-metrics --length <f64> --width <f64> [--open-area <f64>]");
    eprintln!("  plan-cli plan-layout --length <f64> --width <f64> --rooms <u32> [--style <name>]");
    eprintln!(
        "  plan-cli export-layout --length <f64> --width <f64> --rooms <u32> --output <path> [--style <name>]"
    );
}

#[cfg(test)]
mod tests {
    use super::{build_layout, layout_json, parse_flags, required_f64, required_u32};

    fn flags_from(pairs: &[(&str, &str)]) -> super::Flags {
        let args = pairs
            .iter()
            .flat_map(|(flag, value)| [flag.to_string(), value.to_string()])
            .collect::<Vec<_>>();
        parse_flags(&args).expect("flag parsing should succeed")
    }

    #[test]
    fn parses_flag_pairs() {
        let args = vec![
            "--length".to_string(),
            "50".to_string(),
            "--width".to_string(),
            "40".to_string(),
        ];
        let flags = parse_flags(&args).expect("should parse flag pairs");
        assert_eq!(flags.get("--length").map(String::as_str), Some("50"));
        assert_eq!(flags.get("--width").map(String::as_str), Some("40"));
    }

    #[test]
    fn rejects_odd_argument_counts() {
        let args = vec!["--length".to_string()];
        assert!(parse_flags(&args).is_err());
    }

    #[test]
    fn rejects_duplicate_flags() {
        let args = vec![
            "--length".to_string(),
            "50".to_string(),
            "--length".to_string(),
            "60".to_string(),
        ];
        assert!(parse_flags(&args).is_err());
    }

    #[test]
    fn parses_required_float() {
        let flags = flags_from(&[("--length", "52.5")]);
        let length = required_f64(&flags, "--length").expect("required float should parse");
        assert!((length - 52.5).abs() < 1e-12);
    }

    #[test]
    fn parses_required_count() {
        let flags = flags_from(&[("--rooms", "3")]);
        let rooms = required_u32(&flags, "--rooms").expect("required count should parse");
        assert_eq!(rooms, 3);
    }

    #[test]
    fn rejects_negative_counts() {
        let flags = flags_from(&[("--rooms", "-2")]);
        assert!(required_u32(&flags, "--rooms").is_err());
    }

    #[test]
    fn builds_layout_from_flags() {
        let flags = flags_from(&[("--length", "50"), ("--width", "40"), ("--rooms", "2")]);
        let rooms = build_layout(&flags).expect("layout build should succeed");
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].label, "Living Room");
    }

    #[test]
    fn layout_json_carries_every_room() {
        let flags = flags_from(&[
            ("--length", "40"),
            ("--width", "40"),
            ("--rooms", "4"),
            ("--style", "minimal"),
        ]);
        let rooms = build_layout(&flags).expect("layout build should succeed");
        let value = layout_json(&rooms);

        let exported = value["rooms"].as_array().expect("rooms should be an array");
        assert_eq!(exported.len(), 4);
        assert_eq!(exported[0]["label"], "Living Room");
        assert_eq!(exported[2]["label"], "Kitchen");
        assert_eq!(
            exported[0]["size"].as_array().map(Vec::len),
            Some(3)
        );
    }
}
