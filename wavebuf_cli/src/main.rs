use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use wavebuf_core::codec::ascii_to_bytes;
use wavebuf_core::format::{hex_string, DOUBLE_SIZE};
use wavebuf_core::{AppendableSink, ByteBuffer, Complex, DecodeResult, ReadableCursor, StrictReader, Waveform};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "wavebuf",
    about = "Inspect, decode, and build big-endian waveform payload files",
    version
)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print payload length and a hex dump
    Inspect {
        /// Payload file ("-" reads stdin)
        file: PathBuf,
        /// Bytes per dump row
        #[arg(short, long, default_value_t = 16)]
        width: usize,
        /// Print one flat upper-case hex line instead of rows
        #[arg(long)]
        flat: bool,
    },
    /// Decode fields in order according to a read plan
    ///
    /// Plan steps, comma separated: bool, i8, u8, i16, u16, i32, u32, i64,
    /// f64, complex, darray, darray:RATE, wave:RATE, str:LEN, fstr, rest,
    /// skip:LEN
    Decode {
        /// Payload file ("-" reads stdin)
        file: PathBuf,
        /// Read plan, e.g. "fstr,bool,complex,wave:4,rest"
        #[arg(short, long)]
        plan: String,
        /// Fail on the first field that runs past the payload instead of
        /// decoding defaults
        #[arg(long)]
        strict: bool,
    },
    /// Decode one sampled waveform and print its samples
    Waveform {
        /// Payload file ("-" reads stdin)
        file: PathBuf,
        /// Keep one sample out of every RATE
        #[arg(short, long, default_value_t = 1)]
        rate: usize,
        /// Bytes to skip before the waveform's length prefix
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Maximum number of samples to print
        #[arg(short, long, default_value_t = 32)]
        limit: usize,
    },
    /// Build a payload file from a list of values
    ///
    /// Steps, comma separated: i32:V, f64:V, bool:V, str:TEXT, fstr:TEXT,
    /// darray:V/V/..., bytes:HEX
    Encode {
        /// Destination payload file ("-" writes to stdout)
        output: PathBuf,
        /// Values to append, e.g. "fstr:ch-1,bool:true,darray:0/0.001/1.5/2.5"
        #[arg(long)]
        values: String,
    },
}

// ── Read plan ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    F64,
    Complex,
    DoubleArray(usize),
    Waveform(usize),
    Str(usize),
    FormattedStr,
    Rest,
    Skip(usize),
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };
        let num = |what: &str| -> anyhow::Result<usize> {
            let arg = arg.with_context(|| format!("step '{}' needs a {}", name, what))?;
            arg.parse()
                .with_context(|| format!("step '{}': invalid {} '{}'", name, what, arg))
        };
        let step = match name {
            "bool" => Step::Bool,
            "i8" => Step::I8,
            "u8" => Step::U8,
            "i16" => Step::I16,
            "u16" => Step::U16,
            "i32" => Step::I32,
            "u32" => Step::U32,
            "i64" => Step::I64,
            "f64" => Step::F64,
            "complex" => Step::Complex,
            "darray" if arg.is_none() => Step::DoubleArray(1),
            "darray" => Step::DoubleArray(num("sample rate")?),
            "wave" => Step::Waveform(num("sample rate")?),
            "str" => Step::Str(num("length")?),
            "fstr" => Step::FormattedStr,
            "rest" => Step::Rest,
            "skip" => Step::Skip(num("length")?),
            other => anyhow::bail!(
                "unknown read step '{}'. Valid steps: bool, i8, u8, i16, u16, i32, u32, i64, \
                 f64, complex, darray[:RATE], wave:RATE, str:LEN, fstr, rest, skip:LEN",
                other
            ),
        };
        Ok(step)
    }
}

fn parse_plan(plan: &str) -> anyhow::Result<Vec<Step>> {
    plan.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Step::from_str)
        .collect()
}

/// One decoded field, ready for printing.
#[derive(Debug, PartialEq)]
enum Field {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Complex(Complex),
    Doubles(Vec<f64>),
    Text(Option<String>),
    Skipped(usize),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Bool(v) => write!(f, "{}", v),
            Field::Int(v) => write!(f, "{}", v),
            Field::UInt(v) => write!(f, "{}", v),
            Field::Float(v) => write!(f, "{}", v),
            Field::Complex(c) => write!(f, "{} {:+}i", c.re, c.im),
            Field::Doubles(v) => write!(f, "{} values {:?}", v.len(), preview(v, 8)),
            Field::Text(Some(s)) => write!(f, "{:?}", s),
            Field::Text(None) => f.write_str("<absent>"),
            Field::Skipped(n) => write!(f, "skipped {} bytes", n),
        }
    }
}

fn preview(values: &[f64], max: usize) -> Vec<f64> {
    values.iter().copied().take(max).collect()
}

fn decode_step(cursor: &mut dyn ReadableCursor, step: Step) -> Field {
    match step {
        Step::Bool => Field::Bool(cursor.read_boolean()),
        Step::I8 => Field::Int(cursor.read_byte() as i64),
        Step::U8 => Field::UInt(cursor.read_unsigned_byte() as u64),
        Step::I16 => Field::Int(cursor.read_short() as i64),
        Step::U16 => Field::UInt(cursor.read_unsigned_short() as u64),
        Step::I32 => Field::Int(cursor.read_int() as i64),
        Step::U32 => Field::UInt(cursor.read_unsigned_int()),
        Step::I64 => Field::Int(cursor.read_long()),
        Step::F64 => Field::Float(cursor.read_double()),
        Step::Complex => match cursor.read_complex() {
            Some(c) => Field::Complex(c),
            None => Field::Doubles(Vec::new()),
        },
        Step::DoubleArray(rate) => Field::Doubles(cursor.read_double_array_sampled(rate)),
        Step::Waveform(rate) => Field::Doubles(cursor.read_sampled_waveform(rate)),
        Step::Str(l) => Field::Text(cursor.read_string(l)),
        Step::FormattedStr => Field::Text(cursor.read_formatted_string()),
        Step::Rest => Field::Text(Some(cursor.read_string_to_end())),
        Step::Skip(l) => {
            let before = cursor.position();
            cursor.ignore(l);
            Field::Skipped(cursor.position() - before)
        }
    }
}

fn decode_step_strict(r: &mut StrictReader<'_, ByteBuffer>, step: Step) -> DecodeResult<Field> {
    let field = match step {
        Step::Bool => Field::Bool(r.read_boolean()?),
        Step::I8 => Field::Int(r.read_byte()? as i64),
        Step::U8 => Field::UInt(r.read_unsigned_byte()? as u64),
        Step::I16 => Field::Int(r.read_short()? as i64),
        Step::U16 => Field::UInt(r.read_unsigned_short()? as u64),
        Step::I32 => Field::Int(r.read_int()? as i64),
        Step::U32 => Field::UInt(r.read_unsigned_int()?),
        Step::I64 => Field::Int(r.read_long()?),
        Step::F64 => Field::Float(r.read_double()?),
        Step::Complex => Field::Complex(r.read_complex()?),
        Step::DoubleArray(rate) => Field::Doubles(r.read_double_array_sampled(rate)?),
        Step::Waveform(rate) => Field::Doubles(r.read_sampled_waveform(rate)?),
        Step::Str(l) => Field::Text(Some(r.read_string(l)?)),
        Step::FormattedStr => Field::Text(Some(r.read_formatted_string()?)),
        Step::Rest => Field::Text(Some(r.read_string_to_end()?)),
        Step::Skip(l) => {
            r.skip(l)?;
            Field::Skipped(l)
        }
    };
    Ok(field)
}

// ── Encoding ───────────────────────────────────────────────────────────────

fn parse_hex(s: &str) -> anyhow::Result<Vec<u8>> {
    let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 2 != 0 {
        anyhow::bail!("hex string '{}' has an odd number of digits", s);
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .with_context(|| format!("invalid hex byte '{}'", &digits[i..i + 2]))
        })
        .collect()
}

/// Append one `kind:value` step to any sink.
fn encode_step<S: AppendableSink>(sink: &mut S, step: &str) -> anyhow::Result<()> {
    let (kind, value) = step
        .split_once(':')
        .with_context(|| format!("encode step '{}' must look like kind:value", step))?;
    match kind {
        "i32" => {
            let v: i32 = value.parse().with_context(|| format!("invalid i32 '{}'", value))?;
            sink.append_int(v);
        }
        "f64" => {
            let v: f64 = value.parse().with_context(|| format!("invalid f64 '{}'", value))?;
            sink.append(&v.to_be_bytes());
        }
        "bool" => {
            let v: bool = value.parse().with_context(|| format!("invalid bool '{}'", value))?;
            sink.append(&[v as u8]);
        }
        "str" => {
            sink.append_str(value);
        }
        "fstr" => {
            let text = ascii_to_bytes(value);
            sink.append_int(text.len() as i32).append(&text);
        }
        "darray" => {
            let values = value
                .split('/')
                .filter(|v| !v.is_empty())
                .map(|v| v.parse::<f64>().with_context(|| format!("invalid f64 '{}'", v)))
                .collect::<anyhow::Result<Vec<_>>>()?;
            sink.append_int(values.len() as i32);
            for v in values {
                sink.append(&v.to_be_bytes());
            }
        }
        "bytes" => {
            sink.append(&parse_hex(value)?);
        }
        other => anyhow::bail!(
            "unknown encode step '{}'. Valid steps: i32, f64, bool, str, fstr, darray, bytes",
            other
        ),
    }
    Ok(())
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_payload(path: &Path) -> anyhow::Result<ByteBuffer> {
    let bytes = if path.to_str() == Some("-") {
        let mut bytes = Vec::new();
        io::stdin().lock().read_to_end(&mut bytes)?;
        bytes
    } else {
        std::fs::read(path).with_context(|| format!("reading payload file {:?}", path))?
    };
    debug!(bytes = bytes.len(), path = ?path, "loaded payload");
    Ok(ByteBuffer::new(bytes))
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_inspect(file: PathBuf, width: usize, flat: bool) -> anyhow::Result<()> {
    let buf = load_payload(&file)?;

    println!("=== Payload: {:?} ===", file);
    println!("  length         : {} bytes", buf.len());
    println!("  whole doubles  : {}", buf.len() / DOUBLE_SIZE);
    println!();

    if flat {
        println!("{}", buf.hex_dump().unwrap_or_default());
        return Ok(());
    }

    let width = width.max(1);
    for (i, chunk) in buf.raw_bytes().chunks(width).enumerate() {
        print!("  {:06x}  {}", i * width, hex_string(chunk));
        for _ in chunk.len()..width {
            print!("   ");
        }
        print!("  |");
        for b in chunk {
            if b.is_ascii_graphic() || *b == b' ' {
                print!("{}", *b as char);
            } else {
                print!(".");
            }
        }
        println!("|");
    }
    Ok(())
}

fn run_decode(file: PathBuf, plan: &str, strict: bool) -> anyhow::Result<()> {
    let steps = parse_plan(plan)?;
    if steps.is_empty() {
        anyhow::bail!("read plan is empty");
    }
    let mut buf = load_payload(&file)?;
    info!(steps = steps.len(), strict, "decoding payload");

    println!("  {:>8}  {:<14}  value", "offset", "step");
    println!("  {}", "-".repeat(48));
    if strict {
        let mut reader = StrictReader::new(&mut buf);
        for step in steps {
            let offset = reader.position();
            let field = decode_step_strict(&mut reader, step)
                .with_context(|| format!("decoding {:?} at offset {}", step, offset))?;
            println!("  {:>8}  {:<14}  {}", offset, format!("{:?}", step), field);
        }
    } else {
        for step in steps {
            let offset = buf.position();
            let field = decode_step(&mut buf, step);
            println!("  {:>8}  {:<14}  {}", offset, format!("{:?}", step), field);
        }
    }
    eprintln!("  remaining   : {} bytes", buf.remaining());
    Ok(())
}

fn run_waveform(file: PathBuf, rate: usize, offset: usize, limit: usize) -> anyhow::Result<()> {
    let mut buf = load_payload(&file)?;
    buf.ignore(offset);

    let start = buf.position();
    let waveform: Waveform = buf
        .read_waveform(rate)
        .with_context(|| format!("no waveform could be decoded at offset {}", start))?;

    println!("=== Waveform at offset {} (rate {}) ===", start, rate.max(1));
    println!("  t0             : {}", waveform.t0);
    println!("  delta t        : {}", waveform.delta_t);
    println!("  sample spacing : {}", waveform.sample_spacing(rate));
    println!("  samples kept   : {}", waveform.samples.len());
    println!("  consumed       : {} bytes", buf.position() - start);
    println!();
    for (t, v) in waveform.points(rate).take(limit) {
        println!("  {:>16.9}  {}", t, v);
    }
    if waveform.samples.len() > limit {
        println!("  ... ({} samples not shown)", waveform.samples.len() - limit);
    }
    Ok(())
}

fn run_encode(output: PathBuf, values: &str) -> anyhow::Result<()> {
    let mut payload: Vec<u8> = Vec::new();
    for step in values.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        encode_step(&mut payload, step)?;
    }

    if output.to_str() == Some("-") {
        use std::io::Write;
        io::stdout().write_all(&payload)?;
    } else {
        std::fs::write(&output, &payload)
            .with_context(|| format!("writing payload file {:?}", output))?;
        eprintln!("  wrote {} bytes to {:?}", payload.len(), output);
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Inspect { file, width, flat } => run_inspect(file, width, flat),
        Commands::Decode { file, plan, strict } => run_decode(file, &plan, strict),
        Commands::Waveform {
            file,
            rate,
            offset,
            limit,
        } => run_waveform(file, rate, offset, limit),
        Commands::Encode { output, values } => run_encode(output, &values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plan() {
        let steps = parse_plan("fstr, bool,complex,darray,darray:4,wave:2,str:3,rest").unwrap();
        assert_eq!(
            steps,
            vec![
                Step::FormattedStr,
                Step::Bool,
                Step::Complex,
                Step::DoubleArray(1),
                Step::DoubleArray(4),
                Step::Waveform(2),
                Step::Str(3),
                Step::Rest,
            ]
        );
        assert!(parse_plan("wave").is_err());
        assert!(parse_plan("str:x").is_err());
        assert!(parse_plan("float").is_err());
    }

    #[test]
    fn encode_then_decode() {
        let mut payload = Vec::new();
        for step in ["fstr:ch-1", "bool:true", "darray:0/0.5/1/2/3", "bytes:00 0a", "str:end"] {
            encode_step(&mut payload, step).unwrap();
        }
        let mut buf = ByteBuffer::new(payload);
        let plan = parse_plan("fstr,bool,wave:2,u16,rest").unwrap();
        let fields: Vec<Field> = plan.into_iter().map(|s| decode_step(&mut buf, s)).collect();
        assert_eq!(
            fields,
            vec![
                Field::Text(Some("ch-1".to_string())),
                Field::Bool(true),
                Field::Doubles(vec![0.0, 0.5, 1.0, 3.0]),
                Field::UInt(10),
                Field::Text(Some("end".to_string())),
            ]
        );
    }

    #[test]
    fn encode_non_ascii_formatted_string_keeps_alignment() {
        let mut payload = Vec::new();
        encode_step(&mut payload, "fstr:µs").unwrap();
        encode_step(&mut payload, "i32:7").unwrap();
        assert_eq!(payload, vec![0, 0, 0, 2, b'?', b's', 0, 0, 0, 7]);

        let mut buf = ByteBuffer::new(payload);
        assert_eq!(decode_step(&mut buf, Step::FormattedStr), Field::Text(Some("?s".to_string())));
        assert_eq!(decode_step(&mut buf, Step::I32), Field::Int(7));
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn strict_decode_reports_short_field() {
        let mut buf = ByteBuffer::new(vec![0, 0]);
        let mut r = StrictReader::new(&mut buf);
        assert_eq!(decode_step_strict(&mut r, Step::U16).unwrap(), Field::UInt(0));
        assert!(decode_step_strict(&mut r, Step::I32).is_err());
    }

    #[test]
    fn lenient_skip_reports_clamped_length() {
        let mut buf = ByteBuffer::new(vec![0; 3]);
        assert_eq!(decode_step(&mut buf, Step::Skip(10)), Field::Skipped(3));
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(parse_hex("0aFF 10").unwrap(), vec![0x0a, 0xff, 0x10]);
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }
}
