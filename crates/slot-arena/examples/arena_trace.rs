use std::{collections::BTreeMap, process, str::FromStr};

use argh::FromArgs;
use slot_arena::{ArenaConfig, BufferDescriptor, SlotArena};
use snafu::{OptionExt as _, ResultExt as _};
use snafu_utils::{GenericError, Report};
use tracing_subscriber::EnvFilter;

/// Replay arena operations and print the free list after each step.
///
/// Operations: `alloc:<size>`, `write:<id>:<text>`, `realloc:<id>:<size>`,
/// `free:<id>`. Buffers are numbered from 0 in allocation order.
#[derive(Debug, FromArgs)]
struct Args {
    /// size of a slot in bytes
    #[argh(option, default = "ArenaConfig::DEFAULT_SLOT_SIZE")]
    slot_size: usize,

    /// number of slots
    #[argh(option, default = "ArenaConfig::DEFAULT_SLOT_COUNT")]
    slot_count: usize,

    /// log arena events at debug level
    #[argh(switch, short = 'v')]
    verbose: bool,

    #[argh(positional)]
    ops: Vec<Op>,
}

#[derive(Debug)]
enum Op {
    Alloc(usize),
    Write(usize, String),
    Realloc(usize, usize),
    Free(usize),
}

impl FromStr for Op {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |n: &str| {
            n.parse::<usize>()
                .map_err(|err| format!("invalid number {n:?} in {s:?}: {err}"))
        };
        match s.split_once(':') {
            Some(("alloc", size)) => Ok(Self::Alloc(parse(size)?)),
            Some(("free", id)) => Ok(Self::Free(parse(id)?)),
            Some(("write", rest)) => {
                let (id, text) = rest
                    .split_once(':')
                    .ok_or_else(|| format!("expected write:<id>:<text>, got {s:?}"))?;
                Ok(Self::Write(parse(id)?, text.to_owned()))
            }
            Some(("realloc", rest)) => {
                let (id, size) = rest
                    .split_once(':')
                    .ok_or_else(|| format!("expected realloc:<id>:<size>, got {s:?}"))?;
                Ok(Self::Realloc(parse(id)?, parse(size)?))
            }
            _ => Err(format!("unknown operation {s:?}")),
        }
    }
}

fn main() {
    let args: Args = argh::from_env();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&args) {
        let report = Report::new(err);
        eprintln!("{report}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), GenericError> {
    let config = ArenaConfig::new(args.slot_size, args.slot_count);
    let mut arena = SlotArena::with_config(config).whatever_context("failed to create arena")?;
    let mut buffers = BTreeMap::new();
    let mut next_id = 0;

    tracing::info!(
        slot_size = arena.slot_size(),
        slot_count = arena.slot_count(),
        "arena ready"
    );
    print_free_list(&arena);

    for op in &args.ops {
        println!("> {op:?}");
        match op {
            Op::Alloc(size) => {
                let buffer = arena
                    .allocate(*size)
                    .with_whatever_context(|_| format!("failed to allocate {size} bytes"))?;
                print_buffer(next_id, &buffer);
                buffers.insert(next_id, buffer);
                next_id += 1;
            }
            Op::Write(id, text) => {
                let buffer = buffers
                    .get_mut(id)
                    .with_whatever_context(|| format!("no live buffer with id {id}"))?;
                if text.len() > buffer.capacity() {
                    arena
                        .reallocate(buffer, text.len())
                        .with_whatever_context(|_| format!("failed to grow buffer {id}"))?;
                }
                arena.bytes_mut(buffer)[..text.len()].copy_from_slice(text.as_bytes());
                buffer.set_len(text.len());
                print_buffer(*id, buffer);
                println!(
                    "  contents: {:?}",
                    String::from_utf8_lossy(arena.bytes(buffer))
                );
            }
            Op::Realloc(id, size) => {
                let buffer = buffers
                    .get_mut(id)
                    .with_whatever_context(|| format!("no live buffer with id {id}"))?;
                arena
                    .reallocate(buffer, *size)
                    .with_whatever_context(|_| format!("failed to reallocate buffer {id}"))?;
                print_buffer(*id, buffer);
            }
            Op::Free(id) => {
                let mut buffer: BufferDescriptor = buffers
                    .remove(id)
                    .with_whatever_context(|| format!("no live buffer with id {id}"))?;
                arena
                    .try_free(&mut buffer)
                    .with_whatever_context(|_| format!("failed to free buffer {id}"))?;
            }
        }
        print_free_list(&arena);
    }

    if !buffers.is_empty() {
        tracing::warn!(outstanding = buffers.len(), "buffers still allocated at exit");
    }
    Ok(())
}

fn print_buffer(id: usize, buffer: &BufferDescriptor) {
    println!(
        "  buffer {id}: offset={:?}, len={}, max={}",
        buffer.offset(),
        buffer.len(),
        buffer.capacity()
    );
}

fn print_free_list(arena: &SlotArena) {
    let runs = arena
        .free_runs()
        .map(|run| format!("{}..{}", run.start, run.start + run.count))
        .collect::<Vec<_>>();
    println!(
        "  free: {}/{} slots, runs=[{}]",
        arena.free_slot_count(),
        arena.slot_count(),
        runs.join(", ")
    );
}
