//! A small dig-like lookup tool.
//!
//! Usage: lookup [+tcp] [+notcp] [+edns] [+recurse] [+stats] <name> [<type>]
//!
//! An IP address instead of a name results in a reverse lookup.

use dns_engine::base::iana::{Class, Rtype};
use dns_engine::resolv::addr::{parse_ip, reverse_name};
use dns_engine::resolv::conf::TcpMode;
use dns_engine::resolv::stub::Resolver;
use dns_engine::resolv::ResolvConf;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

fn parse_queryopt(conf: &mut ResolvConf, stats: &mut bool, arg: &str) {
    match arg {
        "+tcp" | "+vc" => conf.options.tcp = TcpMode::Only,
        "+notcp" => conf.options.tcp = TcpMode::Disable,
        "+edns" => conf.options.edns0 = true,
        "+recurse" => conf.options.recurse = true,
        "+stats" => *stats = true,
        _ => {
            println!("Warning: ignoring unknown query option {}", arg);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .try_init()
        .ok();

    let mut conf = match ResolvConf::open() {
        Ok(conf) => conf,
        Err(err) => {
            println!("Error reading configuration: {}", err);
            return;
        }
    };
    let mut stats = false;
    let mut args = Vec::new();
    for arg in env::args().skip(1) {
        if arg.starts_with('+') {
            parse_queryopt(&mut conf, &mut stats, &arg)
        } else {
            args.push(arg)
        }
    }
    let mut args = args.into_iter();
    let Some(name) = args.next() else {
        println!("Usage: lookup [OPTIONS] <name> [<type>]");
        return;
    };
    let (qname, qtype) = match parse_ip(&name) {
        Ok(addr) => match reverse_name(addr) {
            Ok(name) => (name.to_string(), Rtype::PTR),
            Err(err) => {
                println!("Error: {}", err);
                return;
            }
        },
        Err(_) => (name, Rtype::A),
    };
    let qtype = match args.next().map(|arg| Rtype::from_str(&arg)) {
        None => qtype,
        Some(Ok(qtype)) => qtype,
        Some(Err(_)) => {
            println!("Not a record type");
            return;
        }
    };

    let mut resolver = match Resolver::open(Some(Arc::new(conf)), None, None)
    {
        Ok(resolver) => resolver,
        Err(err) => {
            println!("Error: {}", err);
            return;
        }
    };
    match resolver.query(&qname, qtype, Class::IN) {
        Ok(answer) => println!("{}", answer),
        Err(err) => println!("Error: {}", err),
    }
    if stats {
        println!("{}", resolver.stats());
    }
}
