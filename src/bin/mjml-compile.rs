use mailcraft_mjml::{
    compile_document_with_options, generate_mjml, parse_mjml, CompileOptions, MjmlError,
};
use std::env;
use std::fs;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, PartialEq)]
enum Format {
    Html,
    Mjml,
    Json,
}

fn usage() -> ! {
    eprintln!("Usage: mjml-compile [--format html|mjml|json] [--config options.yaml] <file.mjml>...");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  mjml-compile welcome.mjml > welcome.html");
    eprintln!("  mjml-compile --format mjml draft.mjml");
    eprintln!("  RUST_LOG=debug mjml-compile --config strict.yaml *.mjml");
    process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut format = Format::Html;
    let mut options = CompileOptions::default();
    let mut files = Vec::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--format" => {
                format = match iter.next().as_deref() {
                    Some("html") => Format::Html,
                    Some("mjml") => Format::Mjml,
                    Some("json") => Format::Json,
                    _ => usage(),
                }
            }
            "--config" => {
                let Some(path) = iter.next() else { usage() };
                options = match CompileOptions::from_file(Path::new(&path)) {
                    Ok(options) => options,
                    Err(e) => {
                        eprintln!("✗ {}:", path);
                        print_error(&e);
                        process::exit(1);
                    }
                };
            }
            "-h" | "--help" => usage(),
            _ => files.push(arg),
        }
    }
    if files.is_empty() {
        usage();
    }

    let mut exit_code = 0;
    for file_path in files {
        match compile_file(&file_path, format, &options) {
            Ok(output) => print!("{}", output),
            Err(e) => {
                eprintln!("✗ {} has errors:", file_path);
                print_error(&e);
                exit_code = 1;
            }
        }
    }

    process::exit(exit_code);
}

fn compile_file(path: &str, format: Format, options: &CompileOptions) -> Result<String, MjmlError> {
    let content = fs::read_to_string(path)
        .map_err(|e| MjmlError::ValidationError(format!("Failed to read file: {}", e)))?;
    let doc = parse_mjml(&content)?;

    match format {
        Format::Html => compile_document_with_options(&doc.root, &doc.head, options),
        Format::Mjml => Ok(generate_mjml(&doc.root, &doc.head)),
        Format::Json => serde_json::to_string_pretty(&doc)
            .map(|json| json + "\n")
            .map_err(|e| MjmlError::RenderError(e.to_string())),
    }
}

fn print_error(error: &MjmlError) {
    match error {
        MjmlError::ParseError {
            line,
            column,
            message,
        } => {
            eprintln!("  Parse error at line {}, column {}:", line, column);
            eprintln!("    {}", message);
        }
        MjmlError::SchemaViolation { parent, child } => {
            eprintln!("  <{}> is not allowed inside <{}>", child, parent);
        }
        MjmlError::InvalidAttribute {
            component,
            attribute,
            value,
            reason,
        } => {
            eprintln!("  Invalid value '{}' for '{}' on <{}>:", value, attribute, component);
            eprintln!("    {}", reason);
        }
        MjmlError::ConfigError(msg) => {
            eprintln!("  Configuration error:");
            eprintln!("    {}", msg);
        }
        e => {
            eprintln!("  {}", e);
        }
    }
}
