use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use daedalus_core::format::{DataType, Instruction, Opcode, Operand, Script, Symbol};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct SymbolEntry {
    index: u32,
    name: String,
    kind: String,
    flags: Vec<String>,
    count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<u32>,
}

impl SymbolEntry {
    fn new(script: &Script, sym: &Symbol) -> Self {
        let has_code = matches!(sym.data_type(), DataType::Function | DataType::Prototype | DataType::Instance)
            && !sym.is_external()
            && !sym.is_member();
        Self {
            index: sym.index(),
            name: sym.name().to_string(),
            kind: sym.data_type().to_string(),
            flags: sym.flags().iter_names().map(|(name, _)| name.to_lowercase()).collect(),
            count: sym.count(),
            parent: sym
                .parent()
                .and_then(|p| script.symbol_by_index(p))
                .map(|p| p.name().to_string()),
            address: has_code.then(|| sym.address()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inst {
    address: u32,
    mnemonic: String,
    operands: Vec<String>,
}

impl Inst {
    fn new(script: &Script, inst: &Instruction) -> Self {
        let name = |index: u32| {
            script
                .symbol_by_index(index)
                .map(|s| s.name().to_string())
                .unwrap_or_else(|| format!("#{}", index))
        };
        let operands = match inst.operand() {
            Operand::None => Vec::new(),
            Operand::Immediate(value) => vec![value.to_string()],
            Operand::Symbol(index) => vec![name(index)],
            Operand::Element { symbol, index } => vec![name(symbol), index.to_string()],
            Operand::Address(target) => match script.symbol_by_address(target) {
                Some(sym) if inst.opcode() == Opcode::Bl => {
                    vec![sym.name().to_string()]
                }
                _ => vec![format!("0x{:08x}", target)],
            },
        };

        Self {
            address: inst.address(),
            mnemonic: inst.mnemonic().to_string(),
            operands,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    name: String,
    address: u32,
    insts: Vec<Inst>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Disassembly {
    version: u8,
    symbols: Vec<SymbolEntry>,
    functions: Vec<Function>,
}

pub struct Disassembler {
    script: Script,
    functions: Vec<Function>,
}

impl Disassembler {
    pub fn new(input: impl AsRef<Path>, encoding: &'static Encoding) -> Result<Self> {
        let input = input.as_ref();
        let bytes = std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
        let script = Script::load_with_encoding(&bytes, encoding)
            .with_context(|| format!("failed to load {}", input.display()))?;
        Ok(Self::from_script(script))
    }

    pub fn from_script(script: Script) -> Self {
        Self { script, functions: Vec::new() }
    }

    pub fn disassemble(&mut self) -> Result<()> {
        let ranges: Vec<(u32, u32, String)> = self
            .script
            .code_ranges()
            .into_iter()
            .map(|(sym, end)| (sym.address(), end, sym.name().to_string()))
            .collect();

        for (start, end, name) in ranges {
            let insts = match self.script.disassemble_range(start, end) {
                Ok(insts) => insts,
                Err(e) => {
                    log::error!("{} @ 0x{:08x}: {}", name, start, e);
                    continue;
                }
            };
            log::debug!("{}: {} instructions", name, insts.len());
            self.functions.push(Function {
                name,
                address: start,
                insts: insts.iter().map(|i| Inst::new(&self.script, i)).collect(),
            });
        }

        Ok(())
    }

    pub fn to_disassembly(&self) -> Disassembly {
        Disassembly {
            version: self.script.version(),
            symbols: self.script.symbols().iter().map(|s| SymbolEntry::new(&self.script, s)).collect(),
            functions: self.functions.clone(),
        }
    }

    pub fn write_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let output = path.as_ref().with_extension("yaml");
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = std::fs::File::create(&output)
            .with_context(|| format!("failed to create {}", output.display()))?;
        serde_yaml::to_writer(&mut writer, &self.to_disassembly())?;
        log::info!("wrote {}", output.display());

        Ok(())
    }
}

/// Dumps the symbol table and function listings of a compiled Daedalus script
#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, required = true)]
    input: PathBuf,

    #[arg(short, long, required = true)]
    output: PathBuf,

    /// Code page of the script's strings
    #[arg(short, long, default_value = "windows-1252")]
    encoding: String,

    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new().parse_filters(&args.log_level).init();

    let encoding = Encoding::for_label(args.encoding.as_bytes())
        .ok_or_else(|| anyhow!("unknown encoding: {}", args.encoding))?;
    let mut disassembler = Disassembler::new(args.input, encoding)?;
    disassembler.disassemble()?;
    disassembler.write_yaml(args.output)?;

    Ok(())
}
