#[macro_use]
extern crate clap;

use std::fmt::Debug;
use std::io::stdout;
use std::path::Path;
use std::process::exit;
use std::str::FromStr;

use num_traits::Float;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use exemplar::{
    to_matlab, AffinityPropagation, Config, NegEuclidean, Parallelism, Preference, RunOptions,
    DEFAULT_DAMPING,
};

use crate::ops::{display_results, from_file};

mod ops;

fn main() {
    let matches = clap_app!(exemplar =>
        (version: crate_version!())
        (about: "Parallelized exemplar-based clustering by Affinity Propagation")
        (@arg INPUT: -i --input +takes_value +required "Path to tab-delimited input file")
        (@arg PREF: -p --preference +takes_value +allow_hyphen_values "Non-positive preference, default=median pairwise similarity")
        (@arg MAX_ITER: -m --max_iter +takes_value "Maximum iterations, default=100")
        (@arg CONV_ITER: -c --convergence_iter +takes_value "Convergence iterations, default=10")
        (@arg DAMPING: -d --damping +takes_value "Damping value in range [0, 1), default=0.75")
        (@arg THREADS: -t --threads +takes_value "Number of worker threads, default=4")
        (@arg SERIAL: --serial "Evaluate every matrix cell on the main thread")
        (@arg PRECISION: -r --precision +takes_value "Set f32 or f64 precision, default=f32")
        (@arg DUMP: --dump "Print the final similarity, availability and responsibility matrices to stderr")
        (@arg VERBOSE: -v ... "Increase logging verbosity")
    )
    .get_matches();

    let level = match matches.occurrences_of("VERBOSE") {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to initialize logging: {}", e);
        exit(1);
    }

    let input_file = matches.value_of("INPUT").unwrap_or_default().to_string();
    if !Path::new(&input_file).exists() {
        eprintln!("Unable to locate input file {}", input_file);
        exit(1);
    }
    let max_iterations = parse_or_exit(matches.value_of("MAX_ITER"), 100_usize, "max_iterations");
    let stability_threshold =
        parse_or_exit(matches.value_of("CONV_ITER"), 10_usize, "convergence_iter");
    let threads = parse_or_exit(matches.value_of("THREADS"), 4_usize, "threads");
    let damping = parse_or_exit(matches.value_of("DAMPING"), DEFAULT_DAMPING, "damping");
    let preference = matches
        .value_of("PREF")
        .map(|p| parse_or_exit(Some(p), 0_f64, "preference"));
    if let Some(p) = preference {
        if p > 0. {
            eprintln!("Preference must be non-positive");
            exit(2);
        }
    }
    // Validate values
    if !(0. ..1.).contains(&damping) {
        eprintln!("Improper parameter set!");
        exit(2);
    }
    if threads < 1 || stability_threshold < 1 || max_iterations < 1 {
        eprintln!("Improper parameter set!");
        exit(2);
    }
    let parallelism = if matches.is_present("SERIAL") {
        Parallelism::Serial
    } else {
        Parallelism::Threads(threads)
    };
    let options = RunOptions {
        max_iterations,
        stability_threshold,
    };
    let dump = matches.is_present("DUMP");
    // Run AP
    match matches.value_of("PRECISION").unwrap_or("f32") {
        "f64" => cluster::<f64>(
            Path::new(&input_file),
            damping,
            preference,
            parallelism,
            options,
            dump,
        ),
        _ => cluster::<f32>(
            Path::new(&input_file),
            damping,
            preference,
            parallelism,
            options,
            dump,
        ),
    };
}

fn parse_or_exit<V>(value: Option<&str>, default: V, name: &str) -> V
where
    V: FromStr,
{
    match value {
        None => default,
        Some(v) => v.parse::<V>().unwrap_or_else(|_| {
            eprintln!("Unable to parse {}", name);
            exit(1);
        }),
    }
}

fn cluster<F>(
    input: &Path,
    damping: f64,
    preference: Option<f64>,
    parallelism: Parallelism,
    options: RunOptions,
    dump: bool,
) where
    F: Float + Send + Sync + FromStr,
    <F as FromStr>::Err: Debug,
{
    let (x, y) = from_file::<F>(input, "\t").unwrap_or_else(|e| {
        eprintln!("{}", e);
        exit(1);
    });
    let config = Config {
        damping: F::from(damping).unwrap_or_else(F::zero),
        parallelism,
        preference: match preference.and_then(F::from) {
            Some(p) => Preference::Value(p),
            None => Preference::Median,
        },
    };
    let mut ap = AffinityPropagation::builder(x)
        .config(config)
        .similarity(NegEuclidean)
        .build()
        .unwrap_or_else(|e| {
            eprintln!("{}", e);
            exit(2);
        });
    let summary = ap.run(options).unwrap_or_else(|e| {
        eprintln!("{}", e);
        exit(2);
    });
    if dump {
        eprintln!("S = {};", to_matlab(ap.similarity()));
        eprintln!("A = {};", to_matlab(ap.availability()));
        eprintln!("R = {};", to_matlab(ap.responsibility()));
    }
    let written = display_results(
        stdout().lock(),
        summary.converged,
        ap.exemplar_map(),
        &y[..],
    );
    if let Err(e) = written {
        eprintln!("Unable to write results: {}", e);
        exit(1);
    }
}
