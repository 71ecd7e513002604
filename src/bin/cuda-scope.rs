//! Command line driver.
//!
//! Compiles a `.cu` file for the requested architectures, or prints the
//! resolved arch and nvcc invocation without running it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use cuda_scope::{api, cuda_device_type, ArchValue, NvccCompiler, OutputMode, Target, GENCODE_FLAG};

#[derive(Parser, Debug)]
#[command(name = "cuda-scope", version, about = "Target arch configuration and nvcc dispatch")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a CUDA source file for the configured arch.
    Compile {
        /// CUDA source file.
        input: PathBuf,

        #[command(flatten)]
        arch: ArchArgs,

        /// Output file; defaults to the input with a .ptx or .fatbin extension.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the resolved arch, output mode and nvcc command line.
    Show {
        #[command(flatten)]
        arch: ArchArgs,

        /// Resolve the arch from a target string such as "cuda -arch=sm_80".
        #[arg(long)]
        target: Option<String>,
    },
    /// Print the CUDA device type and the nvcc configuration.
    Info,
}

#[derive(Args, Debug)]
struct ArchArgs {
    /// Short-form arch such as sm_75.
    #[arg(short, long, conflicts_with = "gencode")]
    arch: Option<String>,

    /// Keep --arch as the nvcc -arch value instead of expanding it to a gencode pair.
    #[arg(long)]
    no_gencode: bool,

    /// Explicit gencode value such as arch=compute_70,code=sm_70. Repeatable.
    #[arg(short, long)]
    gencode: Vec<String>,
}

impl ArchArgs {
    fn value(&self) -> ArchValue {
        if !self.gencode.is_empty() {
            let entries = self
                .gencode
                .iter()
                .flat_map(|g| [GENCODE_FLAG.to_string(), g.clone()])
                .collect();
            return ArchValue::List(entries);
        }
        self.arch.clone().into()
    }

    fn install(&self) -> cuda_scope::ArchResult<()> {
        api::set_target_arch(self.value(), !self.no_gencode)
    }
}

fn default_output(input: &Path, mode: OutputMode) -> PathBuf {
    input.with_extension(mode.as_str())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Compile { input, arch, output } => {
            arch.install()?;
            let code = fs::read_to_string(&input)?;
            let mode = OutputMode::for_arch(&api::get_target_arch(None));
            let data = api::compile(&code)?;
            let output = output.unwrap_or_else(|| default_output(&input, mode));
            fs::write(&output, &data)?;
            println!(
                "{} -> {} ({} bytes, {})",
                input.display(),
                output.display(),
                data.len(),
                mode
            );
        }
        Command::Show { arch, target } => {
            arch.install()?;
            let target = target.as_deref().map(Target::parse).transpose()?;
            let value = api::get_target_arch(target.as_ref());
            let mode = OutputMode::for_arch(&value);
            let compiler = NvccCompiler::from_env();
            let source = Path::new("my_kernel.cu");
            let args = compiler.command_args(mode, &value, source, &default_output(source, mode));

            println!("arch: {}", value);
            println!("mode: {}", mode);
            print!("command: {}", compiler.config().nvcc.display());
            for arg in args {
                print!(" {}", arg.to_string_lossy());
            }
            println!();
        }
        Command::Info => {
            let compiler = NvccCompiler::from_env();
            let config = compiler.config();
            println!("device type: {}", cuda_device_type());
            println!("nvcc: {}", config.nvcc.display());
            if let Some(cxx) = &config.host_compiler {
                println!("host compiler: {}", cxx.display());
            }
            println!("work dir: {}", config.work_dir.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
