use anyhow::{anyhow, Result};
use corecss_shared::byte_stream::{ByteStream, Location};
use corecss_syntax::parser_config::{Context, ParserConfig};
use corecss_syntax::tokenizer::{tokenize_grouped, Token, Tokenizer};
use corecss_syntax::walker::Walker;
use corecss_syntax::{CoreParser, ParseError, ParseOutput};
use simple_logger::SimpleLogger;
use std::fs;
use std::process::exit;

fn bail(message: &str) -> ! {
    println!("{message}");
    exit(1);
}

fn main() -> Result<()> {
    let matches = clap::Command::new("Corecss core grammar parser")
        .version("0.1.0")
        .arg(
            clap::Arg::new("file")
                .help("The file to parse")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("debug")
                .help("Enable debug logging")
                .short('d')
                .long("debug")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("tokens")
                .help("Just print the tokens")
                .long("tokens")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("style-attr")
                .help("Parse the file as the content of a style attribute")
                .long("style-attr")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("ignore-errors")
                .help("Ignore errors")
                .long("ignore-errors")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("quiet")
                .help("Don't display the parse results")
                .long("quiet")
                .short('q')
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let debug = matches.get_flag("debug");
    let quiet = matches.get_flag("quiet");
    let ignore_errors = matches.get_flag("ignore-errors");
    let tokens = matches.get_flag("tokens");
    let style_attr = matches.get_flag("style-attr");
    let file = matches
        .get_one::<String>("file")
        .ok_or_else(|| anyhow!("no file given"))?
        .to_string();

    if debug {
        SimpleLogger::new().init()?;
    }

    let bytes = match fs::read(&file) {
        Ok(bytes) => bytes,
        Err(e) => bail(&format!("Could not read {file}: {e}")),
    };

    if tokens {
        print_tokens(&bytes);
        return Ok(());
    }

    let config = ParserConfig {
        context: if style_attr {
            Context::StyleAttribute
        } else {
            Context::Stylesheet
        },
        source: Some(file.clone()),
        ignore_errors,
        ..Default::default()
    };
    let parser = CoreParser::builder().config(config).build();

    // snippets are cut from the same decoded text the tokenizer reads
    let mut stream = ByteStream::default();
    stream.read_from_bytes(&bytes);
    let css = stream.decoded_text();

    let output = if style_attr {
        parser.parse(&css)
    } else {
        ParseOutput::Stylesheet(parser.parse_stylesheet_bytes(&bytes))
    };

    let errors = match &output {
        ParseOutput::Stylesheet(stylesheet) => {
            if !quiet {
                Walker::new(stylesheet).walk_stdout();
            }
            &stylesheet.errors
        }
        ParseOutput::StyleAttribute { declarations, errors } => {
            if !quiet {
                Walker::new_style_attr(declarations, errors).walk_stdout();
            }
            errors
        }
    };

    for error in errors {
        display_snippet(&css, error);
    }

    Ok(())
}

fn display_snippet(css: &str, err: &ParseError) {
    println!("{err}");

    let lines: Vec<&str> = css.split('\n').collect();
    let line_nr = err.line().saturating_sub(1);
    let col_nr = err.column().saturating_sub(1);

    if col_nr > 1000 {
        println!("Error is too far to the right to display.");
        return;
    }

    // Print the previous 2 lines
    for n in line_nr.saturating_sub(2)..line_nr {
        if let Some(line) = lines.get(n) {
            println!("{:<5}|{}", n + 1, line);
        }
    }

    // Print the line with the error and a pointer to the error
    if let Some(line) = lines.get(line_nr) {
        println!("{:<5}|{}", line_nr + 1, line);
        println!("     |{}^", "-".repeat(col_nr));
    }
    println!();
}

fn print_tokens(bytes: &[u8]) {
    let mut stream = ByteStream::default();
    stream.read_from_bytes(bytes);

    let tokenizer = Tokenizer::new(&mut stream, Location::default());
    for token in tokenize_grouped(tokenizer) {
        print_token(&token, 0);
    }
}

fn print_token(token: &Token, depth: usize) {
    println!(
        "{}{} {} {:?}",
        " ".repeat(depth * 2),
        token.location,
        token.type_name(),
        token.raw
    );
    for child in token.content() {
        print_token(child, depth + 1);
    }
}
