use std::path::PathBuf;
use std::process::ExitCode;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use oursql::database::Database;
use oursql::sql::executor::{Engine, Output};
use oursql::types::row::Row;

fn parse_args() -> PathBuf {
    let args: Vec<String> = std::env::args().collect();
    let mut data_dir: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" => {
                i += 1;
                match args.get(i) {
                    Some(path) => data_dir = Some(PathBuf::from(path)),
                    None => {
                        eprintln!("--data-dir requires a path");
                        std::process::exit(1);
                    }
                }
            }
            other => {
                eprintln!("unknown argument: {other}");
                eprintln!("usage: oursql [--data-dir PATH]");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    data_dir.unwrap_or_else(|| PathBuf::from("./oursql-data"))
}

fn format_rows(rows: &[Row]) -> String {
    if rows.is_empty() {
        return "(0 rows)".to_string();
    }
    let columns: Vec<&str> = rows[0].iter().map(|(name, _)| name.as_str()).collect();
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for row in rows {
        let mut line = Vec::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            let text = row.get(col).map(|v| v.to_string()).unwrap_or_default();
            widths[i] = widths[i].max(text.len());
            line.push(text);
        }
        cells.push(line);
    }

    let sep: String = {
        let mut s = String::from("+");
        for w in &widths {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
        }
        s
    };
    let mut out = vec![sep.clone()];
    let header: String = columns
        .iter()
        .enumerate()
        .fold(String::from("|"), |mut acc, (i, col)| {
            acc.push_str(&format!(" {:<width$} |", col, width = widths[i]));
            acc
        });
    out.push(header);
    out.push(sep.clone());
    for line in &cells {
        let rendered = line
            .iter()
            .enumerate()
            .fold(String::from("|"), |mut acc, (i, cell)| {
                acc.push_str(&format!(" {:<width$} |", cell, width = widths[i]));
                acc
            });
        out.push(rendered);
    }
    out.push(sep);
    out.push(format!(
        "({} row{})",
        rows.len(),
        if rows.len() == 1 { "" } else { "s" }
    ));
    out.join("\n")
}

const HELP: &str = "\
Enter SQL statements terminated by a newline (trailing ';' optional).
Meta-commands:
  .help    show this help
  .tables  list tables
  .quit    exit (also: exit, quit)";

fn repl(engine: &mut Engine) -> rustyline::Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("OurSQL  (data dir: {})", engine.database().data_dir().display());
    println!("Type .help for help, .quit to exit.");

    loop {
        match rl.readline("oursql> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                match line {
                    ".quit" | ".exit" | "exit" | "quit" => break,
                    ".help" => println!("{HELP}"),
                    ".tables" => {
                        let tables = engine.database().list_tables();
                        if tables.is_empty() {
                            println!("(no tables)");
                        } else {
                            for name in tables {
                                println!("{name}");
                            }
                        }
                    }
                    sql => match engine.execute(sql) {
                        Ok(Output::Rows(rows)) => println!("{}", format_rows(&rows)),
                        Ok(Output::Summary {
                            kind,
                            affected_rows,
                        }) => println!("{kind} OK ({affected_rows} rows affected)"),
                        Err(e) => eprintln!("error: {e}"),
                    },
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let data_dir = parse_args();

    let db = match Database::open(&data_dir) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut engine = Engine::new(db);

    if let Err(e) = repl(&mut engine) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }
    if let Err(e) = engine.close() {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
