use std::str::FromStr;
use std::{env, process};

use graphloom::{
    CachePolicy, ConstructionExecutor, GraphLoomError, SqliteTripleStore,
    bench_utils::{professor_command, seed_university_graph},
};

const USAGE: &str = "\
graphloom <command> [args]

commands:
  demo [--db PATH] [--universities N] [--departments N] [--professors N] [--seed N]
      seed a university graph and run the professor construction command
  stats <db>
      print triple counts per predicate
  query <db> <bgp>
      run a basic graph pattern and print its bindings
";

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{USAGE}");
        return;
    }
    let result = match args[1].as_str() {
        "demo" => run_demo(&args[2..]),
        "stats" => run_stats(&args[2..]),
        "query" => run_query(&args[2..]),
        other => {
            eprintln!("error: unknown command '{other}'");
            process::exit(2);
        }
    };
    if let Err(err) = result {
        eprintln!("command failed: {err}");
        process::exit(1);
    }
}

fn run_demo(args: &[String]) -> Result<(), GraphLoomError> {
    let mut db: Option<String> = None;
    let mut universities = 1usize;
    let mut departments = 3usize;
    let mut professors = 1u32;
    let mut seed = 0xD1CEu64;
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let Some(value) = iter.next() else {
            usage_error(&format!("{flag} needs a value"));
        };
        match flag.as_str() {
            "--db" => db = Some(value.clone()),
            "--universities" => universities = parse_number(flag, value),
            "--departments" => departments = parse_number(flag, value),
            "--professors" => professors = parse_number(flag, value),
            "--seed" => seed = parse_number(flag, value),
            other => usage_error(&format!("unknown flag '{other}'")),
        }
    }

    let store = match db {
        Some(path) => SqliteTripleStore::open(path)?,
        None => SqliteTripleStore::open_in_memory()?,
    };
    seed_university_graph(&store, universities, departments)?;
    let before = store.triple_count()?;

    let mut executor = ConstructionExecutor::new(&store, CachePolicy::SmartCache, seed);
    let report = executor.construct(professor_command(professors)?)?;

    println!("seeded triples:        {before}");
    println!("new triples:           {}", report.new_triples);
    println!("pattern applications:  {}", report.pattern_applications);
    println!("query executions:      {}", report.query_executions);
    println!("cache hits/misses:     {}/{}", report.cache_hits, report.cache_misses);
    println!("total triples:         {}", store.triple_count()?);
    Ok(())
}

fn run_stats(args: &[String]) -> Result<(), GraphLoomError> {
    let path = args
        .first()
        .ok_or_else(|| GraphLoomError::invalid_input("stats needs a database path"))?;
    let store = SqliteTripleStore::open(path)?;
    println!("total triples: {}", store.triple_count()?);
    for (predicate, count) in store.predicates()? {
        println!("{predicate}: {count}");
    }
    Ok(())
}

fn run_query(args: &[String]) -> Result<(), GraphLoomError> {
    let [path, bgp] = args else {
        return Err(GraphLoomError::invalid_input(
            "query needs a database path and a pattern",
        ));
    };
    let store = SqliteTripleStore::open(path)?;
    let bindings = graphloom::GraphSource::execute(&store, bgp)?;
    for binding in &bindings {
        let row: Vec<String> = binding
            .variables()
            .into_iter()
            .map(|name| {
                let value = binding.get(&name).map(|v| v.render()).unwrap_or_default();
                format!("?{name}={value}")
            })
            .collect();
        println!("{}", row.join(" "));
    }
    println!("{} binding(s)", bindings.len());
    Ok(())
}

fn parse_number<T: FromStr>(flag: &str, value: &str) -> T {
    value
        .parse()
        .unwrap_or_else(|_| usage_error(&format!("{flag} needs a number, got '{value}'")))
}

fn usage_error(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(2);
}
