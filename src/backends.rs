//! Backend registration and dispatch
//!
//! A backend is the SPI transport the driver runs on. Backends are
//! selected with a string of the form `name` or
//! `name:option1=value1,option2=value2`.

use spinor_core::transport::SpiTransport;

/// Information about a backend
pub struct BackendInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// All backends enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<BackendInfo> {
    let mut backends = Vec::new();

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "In-memory chip emulator (mfr=<hex>,type=<hex>,cap=<hex>,size=<size>,image=<file>,busy=<polls>)",
    });

    #[cfg(feature = "linux-spi")]
    backends.push(BackendInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description: "Linux spidev interface (dev=/dev/spidevX.Y,spispeed=<kHz>,mode=<0-3>)",
    });

    backends
}

/// Generate help text listing all available backends
pub fn backend_help() -> String {
    let backends = available_backends();

    if backends.is_empty() {
        return "No backends available (recompile with backend features enabled)".to_string();
    }

    let mut help = String::from("Available backends:\n");
    for b in &backends {
        help.push_str(&format!("  {:10} - {}\n", b.name, b.description));
    }
    help
}

/// Resolve a name or alias to the canonical backend name
pub fn find_backend(name: &str) -> Option<&'static str> {
    available_backends()
        .into_iter()
        .find(|b| b.name == name || b.aliases.contains(&name))
        .map(|b| b.name)
}

/// An opened backend
pub struct Backend {
    /// The transport handed to the driver
    pub transport: Box<dyn SpiTransport>,
    /// Largest read the backend can take in one transaction
    pub max_read_len: usize,
}

/// Build the transport named by a backend string
pub fn open_backend(spec: &str) -> Result<Backend, Box<dyn std::error::Error>> {
    let (name, options) = parse_backend_string(spec);

    let canonical = find_backend(name).ok_or_else(|| unknown_backend_error(name))?;

    match canonical {
        #[cfg(feature = "dummy")]
        "dummy" => {
            let flash = open_dummy(&options)?;
            Ok(Backend {
                transport: Box::new(flash),
                max_read_len: 64 * 1024,
            })
        }

        #[cfg(feature = "linux-spi")]
        "linux_spi" => {
            log::info!("Opening Linux SPI backend...");
            let spi = spinor_linux_spi::open_linux_spi(&options)
                .map_err(|e| format!("Invalid linux_spi parameters: {}", e))?;
            // Leave room for the longest read header
            let max_read_len = spi
                .max_transfer_len()
                .saturating_sub(spinor_core::spi::MAX_FRAME_LEN);
            Ok(Backend {
                transport: Box::new(spi),
                max_read_len,
            })
        }

        _ => Err(unknown_backend_error(name)),
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(
    options: &[(&str, &str)],
) -> Result<spinor_dummy::DummyFlash, Box<dyn std::error::Error>> {
    use spinor_core::jedec::FlashIdentity;
    use spinor_dummy::{DummyConfig, DummyFlash};

    let default_id = DummyConfig::default().identity;
    let byte = |key: &str, default: u8| -> Result<u8, String> {
        match options.iter().find(|(k, _)| *k == key) {
            Some((_, v)) => u8::from_str_radix(v.trim_start_matches("0x"), 16)
                .map_err(|_| format!("invalid dummy {}: {}", key, v)),
            None => Ok(default),
        }
    };

    let identity = FlashIdentity::new(
        byte("mfr", default_id.manufacturer)?,
        byte("type", default_id.memory_type)?,
        byte("cap", default_id.capacity)?,
    );
    let mut config = DummyConfig::for_identity(identity);
    let mut image = None;

    for (key, value) in options {
        match *key {
            "mfr" | "type" | "cap" => {}
            "size" => match parse_size(value)? {
                0 => return Err(format!("invalid dummy size: {}", value).into()),
                size => config.size = size as usize,
            },
            "busy" => {
                config.busy_polls = value
                    .parse()
                    .map_err(|_| format!("invalid dummy busy: {}", value))?
            }
            "image" => image = Some(std::fs::read(value)?),
            _ => log::warn!("dummy: unknown option: {}={}", key, value),
        }
    }

    log::info!(
        "Emulating {} {} ({} bytes)",
        identity.vendor_name(),
        identity,
        config.size
    );

    Ok(match image {
        Some(data) => DummyFlash::with_data(config, &data),
        None => DummyFlash::new(config),
    })
}

/// Parse a backend string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_backend_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// Parse a size string like "16M", "4096K", "0x1000000" or "65536"
pub fn parse_size(s: &str) -> Result<u32, String> {
    let s = s.trim();

    if let Ok(n) = s.parse::<u32>() {
        return Ok(n);
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).map_err(|_| format!("invalid size: {}", s));
    }

    let lower = s.to_lowercase();
    let (num_str, multiplier) = if let Some(n) = lower
        .strip_suffix("mib")
        .or_else(|| lower.strip_suffix('m'))
    {
        (n, 1024 * 1024)
    } else if let Some(n) = lower
        .strip_suffix("kib")
        .or_else(|| lower.strip_suffix('k'))
    {
        (n, 1024)
    } else {
        return Err(format!("invalid size: {}", s));
    };

    num_str
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| format!("invalid size: {}", s))
}

fn unknown_backend_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown backend: {}\n\n", name);
    msg.push_str(&backend_help());
    msg.into()
}
