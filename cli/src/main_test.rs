use clap::Parser;

use crate::{CliArgs, Commands};

#[test]
fn test_check_accepts_json_flag() {
    let args = CliArgs::try_parse_from(["gmlint", "check", "proj", "--json"]).unwrap();
    match args.command {
        Commands::Check { path, json } => {
            assert_eq!(path.to_str(), Some("proj"));
            assert!(json);
        }
        other => panic!("expected check, got {other:?}"),
    }
    assert!(!args.verbose);
}

#[test]
fn test_global_flags_after_subcommand() {
    let args = CliArgs::try_parse_from(["gmlint", "symbols", "proj", "-v", "--config", "alt.toml"]).unwrap();
    assert!(args.verbose);
    assert_eq!(args.config.as_deref().and_then(|p| p.to_str()), Some("alt.toml"));
}

#[test]
fn test_hover_requires_offset() {
    assert!(CliArgs::try_parse_from(["gmlint", "hover", "proj", "--file", "a/a.gml"]).is_err());
    let args = CliArgs::try_parse_from(["gmlint", "hover", "proj", "--file", "a/a.gml", "--offset", "4"]).unwrap();
    assert!(matches!(args.command, Commands::Hover { offset: 4, .. }));
}
