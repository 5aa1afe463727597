//! Resolver configuration
//!
//! The configuration of the resolver is modeled along the lines of glibc's
//! resolver with some additions from the BSDs. It is normally read from
//! the system's `/etc/resolv.conf` with the lookup order optionally taken
//! from the `hosts` database of `/etc/nsswitch.conf`.
//!
//! All parts of the configuration are public fields of [`ResolvConf`] and
//! may be changed freely. The configuration is shared read-only with the
//! hosts table, the hints table, and any number of resolvers through an
//! `Arc`. Changing it after sharing is up to the caller.

use super::addr::{self, InvalidAddress, DNS_PORT};
use super::search::SearchIter;
use crate::base::name::Name;
use core::fmt;
use core::str::FromStr;
use std::io::{self, BufRead, Read};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use std::{error, fs};
use tracing::{trace, warn};

//------------ Constants -----------------------------------------------------

/// The maximum number of name servers.
pub const MAX_SERVERS: usize = 3;

/// The maximum number of search domains.
pub const MAX_SEARCH: usize = 4;

/// The maximum number of lookup sources.
pub const MAX_LOOKUP: usize = 36;

/// The upper limit for the `ndots` option.
pub const MAX_NDOTS: usize = 15;

/// The upper limit for the `timeout` option.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(30);

/// The upper limit for the `attempts` option.
pub const MAX_ATTEMPTS: usize = 5;

/// The conventional location of the resolver configuration.
pub const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

/// The conventional location of the name service switch configuration.
pub const NSSWITCH_CONF_PATH: &str = "/etc/nsswitch.conf";

//------------ ResolvOptions ------------------------------------------------

/// Options for the resolver configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvOptions {
    /// Add an EDNS0 OPT record to queries.
    pub edns0: bool,

    /// Number of dots before an initial absolute query is made.
    pub ndots: usize,

    /// Timeout to wait for a response from a single server.
    pub timeout: Duration,

    /// Number of rounds through all servers before giving up.
    pub attempts: usize,

    /// Rotate through the servers instead of always starting with the
    /// first one.
    pub rotate: bool,

    /// Perform recursion ourselves, starting at the root servers.
    ///
    /// If not set, queries ask the configured servers for recursion.
    pub recurse: bool,

    /// Smart routing of queries.
    ///
    /// This is accepted for compatibility but has no effect.
    pub smart: bool,

    /// The use of TCP.
    pub tcp: TcpMode,

    /// Debug output was requested. Accepted but ignored.
    pub debug: bool,

    /// Send queries for different record types sequentially.
    ///
    /// Since the resolver only ever has one query outstanding, this is
    /// always true in effect.
    pub single_request: bool,

    /// Use a new socket for each query.
    ///
    /// Since the resolver does this anyway, this has no additional effect.
    pub single_request_reopen: bool,
}

impl Default for ResolvOptions {
    fn default() -> Self {
        ResolvOptions {
            edns0: false,
            ndots: 1,
            timeout: Duration::from_secs(5),
            attempts: 2,
            rotate: false,
            recurse: false,
            smart: false,
            tcp: TcpMode::Enable,
            debug: false,
            single_request: false,
            single_request_reopen: false,
        }
    }
}

//------------ TcpMode -------------------------------------------------------

/// How the resolver uses TCP.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TcpMode {
    /// Use UDP first and retry over TCP if the answer was truncated.
    #[default]
    Enable,

    /// Use TCP only.
    Only,

    /// Never use TCP; truncated answers are final.
    Disable,
}

impl FromStr for TcpMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enable" => Ok(TcpMode::Enable),
            "only" => Ok(TcpMode::Only),
            "disable" => Ok(TcpMode::Disable),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TcpMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            TcpMode::Enable => "enable",
            TcpMode::Only => "only",
            TcpMode::Disable => "disable",
        })
    }
}

//------------ Lookup --------------------------------------------------------

/// A source consulted for answers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lookup {
    /// The hosts table.
    File,

    /// The DNS.
    Bind,

    /// A cache. There is none, so this source is skipped.
    Cache,
}

impl Lookup {
    /// Returns the source named by a word.
    ///
    /// Only the first letter of the word is significant and case is
    /// ignored, so `files`, `file`, and `F` are all [`Lookup::File`].
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        match word.as_bytes().first()?.to_ascii_lowercase() {
            b'f' => Some(Lookup::File),
            b'b' => Some(Lookup::Bind),
            b'c' => Some(Lookup::Cache),
            _ => None,
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Lookup::File => "file",
            Lookup::Bind => "bind",
            Lookup::Cache => "cache",
        })
    }
}

//------------ Syntax --------------------------------------------------------

/// The syntax of a configuration file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Syntax {
    /// The syntax of `/etc/resolv.conf`.
    #[default]
    ResolvConf,

    /// The syntax of `/etc/nsswitch.conf`.
    ///
    /// Only the `hosts` database is used to determine the lookup order.
    Nsswitch,
}

//------------ ResolvConf ----------------------------------------------------

/// Resolver configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvConf {
    /// Addresses of servers to query.
    ///
    /// There can be at most [`MAX_SERVERS`] of them when read from a file.
    pub servers: Vec<SocketAddr>,

    /// The search list.
    pub search: Vec<Name>,

    /// The order in which sources are consulted.
    pub lookup: Vec<Lookup>,

    /// Default options.
    pub options: ResolvOptions,

    /// The local address to bind sockets to.
    ///
    /// A port of zero selects a random port.
    pub iface: Option<SocketAddr>,
}

/// # Creation
///
impl ResolvConf {
    /// Creates a new configuration with default values and no servers.
    #[must_use]
    pub fn new() -> Self {
        ResolvConf {
            servers: Vec::new(),
            search: Vec::new(),
            lookup: vec![Lookup::File, Lookup::Bind],
            options: ResolvOptions::default(),
            iface: None,
        }
    }

    /// Creates a stub configuration using the local host as server.
    ///
    /// This never touches the file system.
    #[must_use]
    pub fn local() -> Self {
        let mut res = Self::new();
        res.finalize();
        res
    }

    /// Creates a configuration for recursive resolution.
    ///
    /// This is the same as [`local`][Self::local] but with the `recurse`
    /// option set.
    #[must_use]
    pub fn root() -> Self {
        let mut res = Self::local();
        res.options.recurse = true;
        res
    }

    /// Loads the system configuration.
    ///
    /// This reads `/etc/resolv.conf` and `/etc/nsswitch.conf`. Missing
    /// files are not an error. If no name servers are configured
    /// afterwards, the local host is used.
    pub fn open() -> Result<Self, Error> {
        let mut res = Self::new();
        for (path, syntax) in [
            (RESOLV_CONF_PATH, Syntax::ResolvConf),
            (NSSWITCH_CONF_PATH, Syntax::Nsswitch),
        ] {
            match res.load_path(path, syntax) {
                Ok(()) => {}
                Err(Error::Io(ref err))
                    if err.kind() == io::ErrorKind::NotFound =>
                {
                    trace!("{} not found", path);
                }
                Err(err) => return Err(err),
            }
        }
        res.finalize();
        Ok(res)
    }

    /// Finalizes the configuration for actual use.
    ///
    /// If `servers` is empty, adds `127.0.0.1:53`. This is exactly what
    /// glibc does.
    pub fn finalize(&mut self) {
        if self.servers.is_empty() {
            self.servers
                .push(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), DNS_PORT));
        }
    }
}

/// # Accessors
///
impl ResolvConf {
    /// Returns the search list expansion for a query name.
    ///
    /// See [`SearchIter`] for details.
    #[must_use]
    pub fn search(&self, qname: &str) -> SearchIter {
        SearchIter::new(qname, &self.search, self.options.ndots)
    }

    /// Replaces the name servers with addresses given as text.
    ///
    /// The configuration is unchanged if any address is invalid.
    pub fn set_servers<'a, I>(&mut self, iter: I) -> Result<(), InvalidAddress>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let servers = iter
            .into_iter()
            .map(|s| addr::parse_server(s, DNS_PORT))
            .collect::<Result<Vec<_>, _>>()?;
        self.servers = servers;
        Ok(())
    }

    /// Returns the name servers in text form.
    ///
    /// The port is included only if it isn't 53.
    #[must_use]
    pub fn server_strings(&self) -> Vec<String> {
        self.servers.iter().map(addr::format_server).collect()
    }

    /// Replaces the lookup order with sources given as words.
    ///
    /// Unknown words are skipped.
    pub fn set_lookup<'a, I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.lookup = iter
            .into_iter()
            .filter_map(Lookup::from_word)
            .take(MAX_LOOKUP)
            .collect();
    }

    /// Sets the local interface address from text.
    ///
    /// A port may be given as with server addresses; it defaults to zero.
    pub fn set_iface(&mut self, addr: &str) -> Result<(), InvalidAddress> {
        self.iface = Some(addr::parse_server(addr, 0)?);
        Ok(())
    }
}

/// # Parsing Configuration Files
///
impl ResolvConf {
    /// Loads configuration from a file, merging it into `self`.
    pub fn load_path<P: AsRef<Path>>(
        &mut self,
        path: P,
        syntax: Syntax,
    ) -> Result<(), Error> {
        let file = fs::File::open(path)?;
        self.load(file, syntax)
    }

    /// Loads configuration from a reader, merging it into `self`.
    pub fn load<R: Read>(
        &mut self,
        reader: R,
        syntax: Syntax,
    ) -> Result<(), Error> {
        let reader = io::BufReader::new(reader);
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = strip_comment(&line);
            let mut words = line.split_whitespace();
            let keyword = match words.next() {
                Some(keyword) => keyword,
                None => continue,
            };
            let res = match syntax {
                Syntax::ResolvConf => self.parse_directive(keyword, words),
                Syntax::Nsswitch => {
                    self.parse_nsswitch(keyword, words);
                    Ok(())
                }
            };
            res.map_err(|reason| Error::Parse {
                line: idx + 1,
                reason,
            })?;
        }
        Ok(())
    }

    fn parse_directive<'a>(
        &mut self,
        keyword: &str,
        mut words: impl Iterator<Item = &'a str>,
    ) -> Result<(), &'static str> {
        match keyword {
            "nameserver" => {
                let addr = words.next().ok_or("missing nameserver address")?;
                let addr = addr::parse_server(addr, DNS_PORT)
                    .map_err(|_| "invalid nameserver address")?;
                if self.servers.len() < MAX_SERVERS {
                    self.servers.push(addr);
                } else {
                    trace!("ignoring nameserver {}: too many servers", addr);
                }
            }
            "domain" | "search" => {
                let mut search = Vec::new();
                for word in words.take(MAX_SEARCH) {
                    search.push(
                        Name::from_str(word)
                            .map_err(|_| "invalid search domain")?,
                    );
                }
                self.search = search;
            }
            "lookup" => self.set_lookup(words),
            "interface" => {
                let ip = words.next().ok_or("missing interface address")?;
                let ip: IpAddr =
                    ip.parse().map_err(|_| "invalid interface address")?;
                let port = match words.next() {
                    Some(port) => {
                        port.parse().map_err(|_| "invalid interface port")?
                    }
                    None => 0,
                };
                self.iface = Some(SocketAddr::new(ip, port));
            }
            "options" => {
                for word in words {
                    self.parse_option(word)?;
                }
            }
            "sortlist" => {}
            _ => {
                warn!("ignoring unknown resolv.conf keyword '{}'", keyword);
            }
        }
        Ok(())
    }

    fn parse_option(&mut self, word: &str) -> Result<(), &'static str> {
        let (name, arg) = match word.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (word, None),
        };
        let number = |arg: Option<&str>| -> Result<usize, &'static str> {
            arg.ok_or("missing option argument")?
                .parse()
                .map_err(|_| "invalid option argument")
        };
        match name {
            "ndots" => self.options.ndots = number(arg)?.min(MAX_NDOTS),
            "timeout" => {
                self.options.timeout =
                    Duration::from_secs(number(arg)? as u64).min(MAX_TIMEOUT)
            }
            "attempts" => {
                self.options.attempts = number(arg)?.min(MAX_ATTEMPTS)
            }
            "edns0" => self.options.edns0 = true,
            "rotate" => self.options.rotate = true,
            "recurse" => self.options.recurse = true,
            "smart" => self.options.smart = true,
            "debug" => self.options.debug = true,
            "single-request" => self.options.single_request = true,
            "single-request-reopen" => {
                self.options.single_request_reopen = true
            }
            "use-vc" => self.options.tcp = TcpMode::Only,
            "tcp" => {
                self.options.tcp = match arg {
                    None => TcpMode::Only,
                    Some(arg) => {
                        arg.parse().map_err(|_| "invalid tcp mode")?
                    }
                }
            }
            // Ignore unknown options.
            _ => trace!("ignoring unknown option '{}'", word),
        }
        Ok(())
    }

    fn parse_nsswitch<'a>(
        &mut self,
        keyword: &str,
        words: impl Iterator<Item = &'a str>,
    ) {
        if keyword != "hosts:" {
            return;
        }
        let mut lookup = Vec::new();
        let mut in_action = false;
        for word in words {
            // Action blocks like `[NOTFOUND=return]` may contain spaces.
            if in_action || word.starts_with('[') {
                in_action = !word.ends_with(']');
                continue;
            }
            let source = match word {
                "files" => Lookup::File,
                "dns" => Lookup::Bind,
                "cache" => Lookup::Cache,
                _ => {
                    trace!("ignoring nsswitch source '{}'", word);
                    continue;
                }
            };
            if lookup.len() < MAX_LOOKUP {
                lookup.push(source);
            }
        }
        self.lookup = lookup;
    }
}

//--- Default

impl Default for ResolvConf {
    fn default() -> Self {
        Self::new()
    }
}

//--- Display

impl fmt::Display for ResolvConf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for server in &self.servers {
            writeln!(f, "nameserver {}", addr::format_server(server))?;
        }
        if !self.search.is_empty() {
            f.write_str("search")?;
            for name in &self.search {
                write!(f, " {}", name.to_relative_string())?;
            }
            writeln!(f)?;
        }
        if !self.lookup.is_empty() {
            f.write_str("lookup")?;
            for lookup in &self.lookup {
                write!(f, " {}", lookup)?;
            }
            writeln!(f)?;
        }
        if let Some(iface) = self.iface {
            writeln!(f, "interface {} {}", iface.ip(), iface.port())?;
        }

        // Collect options so we only print them if there are any
        // non-default ones.
        let default = ResolvOptions::default();
        let opts = &self.options;
        let mut options = Vec::new();
        if opts.ndots != default.ndots {
            options.push(format!("ndots:{}", opts.ndots));
        }
        if opts.timeout != default.timeout {
            options.push(format!("timeout:{}", opts.timeout.as_secs()));
        }
        if opts.attempts != default.attempts {
            options.push(format!("attempts:{}", opts.attempts));
        }
        for (set, name) in [
            (opts.edns0, "edns0"),
            (opts.rotate, "rotate"),
            (opts.recurse, "recurse"),
            (opts.smart, "smart"),
            (opts.debug, "debug"),
            (opts.single_request, "single-request"),
            (opts.single_request_reopen, "single-request-reopen"),
        ] {
            if set {
                options.push(name.into());
            }
        }
        if opts.tcp != TcpMode::Enable {
            options.push(format!("tcp:{}", opts.tcp));
        }
        if !options.is_empty() {
            writeln!(f, "options {}", options.join(" "))?;
        }
        Ok(())
    }
}

//------------ Helpers -------------------------------------------------------

/// Removes a comment starting with `#` or `;` from a line.
fn strip_comment(line: &str) -> &str {
    match line.find(['#', ';']) {
        Some(idx) => &line[..idx],
        None => line,
    }
}

//------------ Error --------------------------------------------------------

/// An error happened while loading a configuration file.
#[derive(Debug)]
pub enum Error {
    /// A line of the file could not be parsed.
    Parse {
        /// The line number, starting at 1.
        line: usize,

        /// What was wrong.
        reason: &'static str,
    },

    /// Something happend while reading.
    Io(io::Error),
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Parse { .. } => None,
            Error::Io(ref err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Error {
        Error::Io(error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Parse { line, reason } => {
                write!(f, "line {}: {}", line, reason)
            }
            Error::Io(ref err) => err.fmt(f),
        }
    }
}

//============ Testing ======================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn load(text: &str) -> Result<ResolvConf, Error> {
        let mut conf = ResolvConf::new();
        conf.load(Cursor::new(text), Syntax::ResolvConf)?;
        Ok(conf)
    }

    #[test]
    fn parse_resolv_conf() {
        let conf = load(
            "# comment\n\
             nameserver 192.0.2.1\n\
             nameserver [2001:db8::53]:5353 ; trailing comment\n\
             nameserver 192.0.2.3\n\
             nameserver 192.0.2.4\n\
             domain example.org\n\
             search example.com corp.internal\n\
             sortlist 130.155.160.0/255.255.240.0\n\
             options ndots:2 timeout:60 attempts:3 rotate edns0 tcp:disable\n",
        )
        .unwrap();
        assert_eq!(
            conf.server_strings(),
            ["192.0.2.1", "[2001:db8::53]:5353", "192.0.2.3"]
        );
        assert_eq!(conf.search.len(), 2);
        assert_eq!(conf.search[1].to_string(), "corp.internal.");
        assert_eq!(conf.options.ndots, 2);
        assert_eq!(conf.options.timeout, MAX_TIMEOUT);
        assert_eq!(conf.options.attempts, 3);
        assert!(conf.options.rotate);
        assert!(conf.options.edns0);
        assert_eq!(conf.options.tcp, TcpMode::Disable);
    }

    #[test]
    fn later_directives_override() {
        let conf = load(
            "search a.example b.example\n\
             domain c.example\n\
             options tcp\n",
        )
        .unwrap();
        assert_eq!(conf.search, vec![Name::from_str("c.example").unwrap()]);
        assert_eq!(conf.options.tcp, TcpMode::Only);
    }

    #[test]
    fn parse_errors() {
        match load("\nnameserver not-an-address\n") {
            Err(Error::Parse { line: 2, .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(load("options ndots:x\n").is_err());
        assert!(load("search a..b\n").is_err());
        // Unknown keywords and options are ignored.
        assert!(load("frobnicate\noptions frob inet6\n").is_ok());
    }

    #[test]
    fn lookup_and_interface() {
        let conf =
            load("lookup bind file yp\ninterface 192.0.2.9 4000\n").unwrap();
        assert_eq!(conf.lookup, [Lookup::Bind, Lookup::File]);
        assert_eq!(conf.iface, Some("192.0.2.9:4000".parse().unwrap()));
    }

    #[test]
    fn nsswitch() {
        let mut conf = ResolvConf::new();
        conf.load(
            Cursor::new(
                "passwd: files\n\
                 hosts: files [NOTFOUND=return] mdns4_minimal dns cache\n",
            ),
            Syntax::Nsswitch,
        )
        .unwrap();
        assert_eq!(conf.lookup, [Lookup::File, Lookup::Bind, Lookup::Cache]);
    }

    #[test]
    fn local_and_root() {
        let local = ResolvConf::local();
        assert_eq!(local.servers, ["127.0.0.1:53".parse().unwrap()]);
        assert!(!local.options.recurse);
        assert!(ResolvConf::root().options.recurse);
    }

    #[test]
    fn display() {
        let mut conf = ResolvConf::local();
        conf.search.push(Name::from_str("example.com").unwrap());
        conf.options.ndots = 3;
        conf.options.tcp = TcpMode::Only;
        conf.set_iface("192.0.2.7").unwrap();
        assert_eq!(
            conf.to_string(),
            "nameserver 127.0.0.1\n\
             search example.com\n\
             lookup file bind\n\
             interface 192.0.2.7 0\n\
             options ndots:3 tcp:only\n"
        );
        let mut reloaded = ResolvConf::new();
        reloaded
            .load(Cursor::new(conf.to_string()), Syntax::ResolvConf)
            .unwrap();
        assert_eq!(reloaded, conf);
    }

    #[test]
    fn setters() {
        let mut conf = ResolvConf::new();
        assert!(conf.set_servers(["192.0.2.1", "bogus"]).is_err());
        assert!(conf.servers.is_empty());
        conf.set_servers(["192.0.2.1", "[::1]:53"]).unwrap();
        assert_eq!(conf.server_strings(), ["192.0.2.1", "::1"]);
        conf.set_lookup(["Cache", "files"]);
        assert_eq!(conf.lookup, [Lookup::Cache, Lookup::File]);
    }
}
