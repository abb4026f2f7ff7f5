use ariadne::Source;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::io::{self, IsTerminal, Read};
use tokcas_compute::{
    ctxt::Ctxt,
    error::Error,
    fractions::fractions_and_group,
    simplify::simpa_repeat_side,
    token::{fmt::display, from_ast::parse_equation},
};

/// Reads the log level from `TOKCAS_LOG`, defaulting to warnings only.
fn log_level() -> LevelFilter {
    std::env::var("TOKCAS_LOG")
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Simplifies both sides of the given equation or expression, returning it formatted.
fn simplify(input: &str, cx: &mut Ctxt) -> Result<Option<String>, Error> {
    let (mut lhs, mut rhs) = match parse_equation(cx, input) {
        Ok(sides) => sides,
        Err(err) => {
            if let Err(err) = err.build_report("input").eprint(("input", Source::from(input))) {
                eprintln!("{}", err);
            }
            return Ok(None);
        },
    };

    simpa_repeat_side(cx, &mut lhs, false, false)?;
    fractions_and_group(cx, &mut lhs)?;
    let mut out = display(cx, &lhs);
    if !rhs.is_empty() {
        simpa_repeat_side(cx, &mut rhs, false, false)?;
        fractions_and_group(cx, &mut rhs)?;
        out.push_str(" = ");
        out.push_str(&display(cx, &rhs));
    }
    Ok(Some(out))
}

/// Simplifies one input, printing the result and any warnings.
fn read_eval(input: &str, cx: &mut Ctxt) {
    match simplify(input, cx) {
        Ok(Some(out)) => println!("{}", out),
        Ok(None) => (),
        Err(err) => eprintln!("{}", err),
    }
    for warning in cx.take_warnings() {
        eprintln!("warning: {}", warning);
    }
}

fn main() {
    // fails only if a logger is already installed
    let _ = TermLogger::init(log_level(), Config::default(), TerminalMode::Stderr, ColorChoice::Auto);

    let mut cx = Ctxt::default();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if !args.is_empty() {
        for input in &args {
            read_eval(input, &mut cx);
        }
    } else if !io::stdin().is_terminal() {
        // one expression per line
        let mut input = String::new();
        if let Err(err) = io::stdin().read_to_string(&mut input) {
            eprintln!("{}", err);
            return;
        }
        for line in input.lines().filter(|line| !line.trim().is_empty()) {
            read_eval(line, &mut cx);
        }
    } else {
        eprintln!("usage: simplify <expression>...");
    }
}
