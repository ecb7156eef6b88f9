//! ZCAD 导入导出命令行工具
//!
//! 不依赖几何内核的操作：DXF 转换、偏好设置查看与修改、格式列表。

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use zcad_core::object::ObjectRef;
use zcad_import::params::{ParamValue, ParameterManager};
use zcad_import::settings::DXF_READ_SOURCE;
use zcad_import::{Args, FileFormat, ImportModule, NullKernel, Value};

#[derive(Parser)]
#[command(name = "zcad-import")]
#[command(about = "CAD import/export bridge (STEP, IGES, glTF, DXF)", long_about = None)]
struct Cli {
    /// 日志详细程度（-v info，-vv debug，-vvv trace）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// 偏好设置文件（默认位于用户配置目录）
    #[arg(long, global = true)]
    prefs: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a DXF file and write its geometry to another DXF file
    ConvertDxf {
        input: PathBuf,
        output: PathBuf,
        /// Output DXF version (12 or 14; other values keep the preference)
        #[arg(long)]
        dxf_version: Option<i64>,
        /// Write curves as polylines
        #[arg(long)]
        polyline: bool,
        /// Abort on malformed entities instead of skipping them
        #[arg(long)]
        strict: bool,
        /// Group imported objects by layer
        #[arg(long)]
        group_layers: bool,
    },
    /// Inspect or change stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// List supported file formats
    Formats,
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Print one value, e.g. `prefs get "User parameter:BaseApp/Preferences/Mod/Import" ExportLegacy`
    Get { group: String, key: String },
    /// Set a value; true/false, integers and floats are typed automatically
    Set {
        group: String,
        key: String,
        value: String,
    },
    /// Print every value in a group
    Show { group: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let prefs_path = match cli.prefs {
        Some(path) => path,
        None => ParameterManager::default_path().context("no user configuration directory")?,
    };
    let params = ParameterManager::load(&prefs_path)
        .with_context(|| format!("failed to load preferences from {}", prefs_path.display()))?;

    match cli.command {
        Commands::ConvertDxf {
            input,
            output,
            dxf_version,
            polyline,
            strict,
            group_layers,
        } => convert_dxf(params, &input, &output, dxf_version, polyline, strict, group_layers),
        Commands::Prefs { action } => prefs(params, action),
        Commands::Formats => {
            list_formats();
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )?;
    Ok(())
}

fn path_value(path: &Path) -> Result<Value> {
    match path.to_str() {
        Some(s) => Ok(Value::from(s)),
        None => bail!("path is not valid UTF-8: {}", path.display()),
    }
}

fn convert_dxf(
    params: ParameterManager,
    input: &Path,
    output: &Path,
    dxf_version: Option<i64>,
    polyline: bool,
    strict: bool,
    group_layers: bool,
) -> Result<()> {
    let mut module = ImportModule::with_params(NullKernel, params);
    if group_layers {
        module
            .params_mut()
            .group_by_path_mut(DXF_READ_SOURCE)?
            .set_bool("dxfGroupLayers", true);
    }

    module.call(
        "readDXF",
        &Args::new()
            .arg(path_value(input)?)
            .arg("Drawing")
            .arg(!strict),
    )?;

    let doc = module
        .app()
        .get_document("Drawing")
        .context("readDXF did not create a document")?;
    let objects: Vec<Value> = doc
        .objects()
        .filter(|o| o.is_part_feature())
        .map(|o| Value::Object(ObjectRef::new(doc.name(), o.name.as_str())))
        .collect();
    let count = objects.len();

    module.call(
        "writeDXFObject",
        &Args::new()
            .arg(Value::List(objects))
            .arg(path_value(output)?)
            .arg(dxf_version.unwrap_or(-1))
            .arg(polyline),
    )?;

    info!("converted {} object(s) to {}", count, output.display());
    println!("{} -> {} ({} objects)", input.display(), output.display(), count);
    Ok(())
}

fn prefs(mut params: ParameterManager, action: PrefsAction) -> Result<()> {
    match action {
        PrefsAction::Get { group, key } => match params.group_by_path(&group)?.get(&key) {
            Some(value) => println!("{}", value),
            None => bail!("'{}' is not set in {}", key, group),
        },
        PrefsAction::Set { group, key, value } => {
            let value = ParamValue::parse(&value);
            params.group_by_path_mut(&group)?.set(&key, value.clone());
            params.save()?;
            info!("{}/{} = {}", group, key, value);
        }
        PrefsAction::Show { group } => {
            let group_ref = params.group_by_path(&group)?;
            for (key, value) in group_ref.entries() {
                println!("{} = {}", key, value);
            }
            for name in group_ref.group_names() {
                println!("{}/", name);
            }
        }
    }
    Ok(())
}

fn list_formats() {
    for (format, extensions) in FileFormat::all() {
        let import = if format.can_import() || *format == FileFormat::Dxf {
            "import"
        } else {
            "-"
        };
        let export = if format.can_export() || *format == FileFormat::Dxf {
            "export"
        } else {
            "-"
        };
        println!("{:<6} {:<8} {:<8} .{}", format.name(), import, export, extensions.join(" ."));
    }
}
