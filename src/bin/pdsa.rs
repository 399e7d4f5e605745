#[macro_use]
extern crate clap;

use std::fs;
use std::mem;
use std::process;
use std::time;

use libc::{getrusage, rusage, RUSAGE_SELF};
use pdsa::{
    distributed_suffix_array_with, is_valid_suffix_array, lcp_array, longest_repeated_substring, share_text,
    Communicator, Config, Construction, Exchange, ProcessGroup, RankSharing, SortPolicy,
};

fn main() {
    let matches = clap_app!(pdsa =>
        (about: "Prefix doubling suffix sorting test")
        (@arg PROCS: -p --procs +takes_value "number of processes")
        (@arg TIMES: -t --times +takes_value "repeat multiple times")
        (@arg THRESHOLD: --threshold +takes_value "sort shorter texts on the coordinator")
        (@arg CHECK: -c --check "check the suffix array")
        (@arg LRS: -l --lrs "find the longest repeated substring")
        (@arg RADIX: --radix "sort rank pairs by radix sort")
        (@arg CENTRALIZED: --centralized "sort every round on the coordinator")
        (@arg GATHER: --gather "publish ranks through the coordinator")
        (@arg INPUT: +required "the data to sort")
    )
    .get_matches();

    let input_file = matches.value_of("INPUT").unwrap();
    let procs = parse_arg(matches.value_of("PROCS"), 4).max(1);
    let repeat_times = parse_arg(matches.value_of("TIMES"), 1).max(1);

    let mut config = Config::default();
    if let Some(threshold) = matches.value_of("THRESHOLD") {
        config = config.with_threshold(parse_arg(Some(threshold), config.threshold));
    }
    if matches.is_present("RADIX") {
        config = config.with_local_sort(SortPolicy::Radix);
    }
    if matches.is_present("CENTRALIZED") {
        config = config.with_exchange(Exchange::Centralized);
    }
    if matches.is_present("GATHER") {
        config = config.with_sharing(RankSharing::GatherBroadcast);
    }

    let text = match fs::read(&input_file) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: {:?}", err);
            process::exit(1);
        }
    };
    eprintln!("load {} bytes from `{}`", text.len(), &input_file);

    let mut group = ProcessGroup::new(procs);
    let mut built = Construction::default();
    let mut times = String::new();
    for _ in 0..repeat_times {
        let (result, dur) = timeit(|| {
            group.run_root(|comm| {
                // only the coordinator owns the input, like a real launcher would.
                let owned = if comm.is_root() { Some(text.clone()) } else { None };
                let shared = share_text(comm, owned)?;
                distributed_suffix_array_with(comm, &shared[..], shared.len(), &config)
            })
        });
        built = match result {
            Ok(built) => built,
            Err(err) => {
                eprintln!("error: {}", err);
                process::exit(if err.is_fatal() { 2 } else { 1 });
            }
        };
        times.push_str(format!("{:.3}s ", dur.as_secs_f64()).as_str());
    }
    eprintln!("procs: {}", group.size());
    eprintln!(" time: {}", times);
    eprintln!("round: {}", built.rounds);
    eprintln!("  rss: {:.3}MiB", get_peak_rss_kib() as f64 / 1024.0);

    if matches.is_present("CHECK") {
        eprintln!("check: {}", is_valid_suffix_array(&text[..], &built.sa[..]));
    }
    if matches.is_present("LRS") {
        let (lcp, dur) = timeit(|| lcp_array(&text[..], &built.sa[..]));
        eprintln!("  lcp: {:.3}s", dur.as_secs_f64());
        match longest_repeated_substring(&text[..], &built.sa[..], &lcp[..]) {
            Some(s) => eprintln!("  lrs: {:?} (length: {})", String::from_utf8_lossy(s), s.len()),
            None => eprintln!("  lrs: no repeat found"),
        }
    }
}

fn parse_arg(value: Option<&str>, default: usize) -> usize {
    value.and_then(|s| s.parse::<usize>().ok()).unwrap_or(default)
}

fn timeit<F, T>(f: F) -> (T, time::Duration)
where
    F: FnOnce() -> T,
{
    let start = time::Instant::now();
    let ret = f();
    let dur = start.elapsed();
    (ret, dur)
}

fn get_peak_rss_kib() -> u64 {
    let mut ru;
    unsafe {
        ru = mem::zeroed::<rusage>();
        getrusage(RUSAGE_SELF, &mut ru as *mut rusage);
    }
    ru.ru_maxrss as u64
}
