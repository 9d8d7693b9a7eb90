//! dynamic-translator 命令行入口
//!
//! 读取 HTML 文件，启动翻译会话，按需切换语言并等待翻译队列处理完毕，
//! 最后输出修改后的文档。

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use clap::Parser;
use tokio::task::LocalSet;

use dynamic_translator::env::{core as env_core, generate_env_docs, EnvConfig, EnvVar};
use dynamic_translator::network::{parse_cookie_header, HttpTransport, Transport};
use dynamic_translator::switcher::PageState;
use dynamic_translator::translation::config::ConfigManager;
use dynamic_translator::utils::url::Url;
use dynamic_translator::{Bootstrap, Document, DynamicTranslator, FrontendConfig};

#[derive(Parser, Debug)]
#[command(name = "dynamic-translator")]
#[command(version)]
#[command(about = "Switch the language of an HTML page and translate its text through a backend AJAX endpoint")]
struct Cli {
    /// HTML document to process
    #[arg(value_name = "FILE", required_unless_present_any = ["env_docs", "generate_config"])]
    input: Option<PathBuf>,

    /// Language to switch to
    #[arg(short, long)]
    lang: Option<String>,

    /// Write the resulting document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Backend AJAX endpoint
    #[arg(long)]
    ajax_url: Option<String>,

    /// Request nonce
    #[arg(long)]
    nonce: Option<String>,

    /// Language the document is currently in
    #[arg(long)]
    current_lang: Option<String>,

    /// Address of the page, used for the lang query parameter
    #[arg(long, default_value = "http://localhost/")]
    page_url: String,

    /// Cookie header sent with the page request
    #[arg(long)]
    cookie: Option<String>,

    /// JSON file with flags and preloaded dynamic translations
    #[arg(long)]
    bootstrap: Option<PathBuf>,

    /// Charset of the input document
    #[arg(long, default_value = "")]
    encoding: String,

    /// Translate the whole page after switching
    #[arg(short = 't', long)]
    auto_translate: bool,

    /// Never translate the whole page, even if the configuration asks for it
    #[arg(long, conflicts_with = "auto_translate")]
    no_translate: bool,

    /// Print the supported environment variables and exit
    #[arg(long)]
    env_docs: bool,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "PATH")]
    generate_config: Option<String>,
}

fn init_logging() {
    let (level, no_color) = match EnvConfig::from_env() {
        Ok(env) => (env.log_level, env.no_color),
        Err(e) => {
            eprintln!("Warning: {}", e);
            (
                env_core::LogLevel::get().unwrap_or_else(|_| "info".to_string()),
                env_core::NoColor::get().unwrap_or(false),
            )
        }
    };
    let level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(!no_color)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<FrontendConfig, Box<dyn std::error::Error>> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };
    let mut config = manager.into_config();

    if let Some(ref ajax_url) = cli.ajax_url {
        config.ajax_url = ajax_url.clone();
    }
    if let Some(ref nonce) = cli.nonce {
        config.nonce = nonce.clone();
    }
    if let Some(ref current_lang) = cli.current_lang {
        config.current_lang = current_lang.clone();
    }
    if cli.auto_translate {
        config.auto_translate = true;
    }
    if cli.no_translate {
        config.auto_translate = false;
    }

    config.validate()?;
    Ok(config)
}

fn load_bootstrap(path: &Option<PathBuf>) -> Result<Bootstrap, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => Ok(Bootstrap::default()),
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&cli)?;
    let bootstrap = load_bootstrap(&cli.bootstrap)?;

    let input = cli.input.as_ref().ok_or("no input file given")?;
    let data = fs::read(input)?;
    let document = Document::from_bytes(&data, cli.encoding.clone());

    let mut page = PageState::new(Url::parse(&cli.page_url)?);
    if let Some(ref header) = cli.cookie {
        page = page.with_cookies(parse_cookie_header(header));
    }

    let transport: Rc<dyn Transport> =
        Rc::new(HttpTransport::new(&config.ajax_url, config.request_timeout())?);
    let translator = DynamicTranslator::with_page(config, document, transport, page);
    translator.init(bootstrap);

    if let Some(ref lang) = cli.lang {
        let outcome = translator.change_language(lang).await?;
        tracing::info!("语言切换结果: {:?}", outcome);
    }

    // 观察器入队的内容不会自动调度，这里补一次
    translator.wait_idle().await;
    while translator.pending() > 0 {
        translator.flush();
        translator.wait_idle().await;
    }

    let stats = translator.stats();
    tracing::info!(
        "翻译完成: {} 批次, {} 请求, {} 失败",
        stats.batches,
        stats.dispatched,
        stats.failed
    );
    if translator.page().reload_requested() {
        tracing::info!("后端要求刷新页面: {}", translator.page().url());
    }

    let html = translator.serialize_with_encoding(&cli.encoding)?;
    match cli.output {
        Some(ref path) => fs::write(path, html)?,
        None => io::stdout().write_all(&html)?,
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if cli.env_docs {
        print!("{}", generate_env_docs());
        return;
    }

    init_logging();

    if let Some(ref path) = cli.generate_config {
        match ConfigManager::generate_example_config(path) {
            Ok(()) => println!("Example configuration written to {}", path),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            process::exit(1);
        }
    };

    let local = LocalSet::new();
    if let Err(e) = local.block_on(&runtime, run(cli)) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
