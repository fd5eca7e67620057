mod commands;
mod docker;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use deckhand_cloud::{ProviderStore, default_provider};
use deckhand_deploy::ClusterHandle;

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(about = "コンテナを積んで、届ける。ビルドからデプロイまでを一隻で。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dockerイメージをビルド
    Build {
        /// ビルド対象のイメージ（省略時は全イメージ）
        #[arg(short = 'n', long)]
        image: Option<String>,
        /// ビルド後にレジストリにプッシュ
        #[arg(long)]
        push: bool,
        /// イメージタグを指定
        #[arg(long)]
        tag: Option<String>,
        /// レジストリURL（例: ghcr.io/owner）
        #[arg(long)]
        registry: Option<String>,
        /// レジストリのユーザー名（ストアに認証情報がない場合）
        #[arg(long)]
        username: Option<String>,
        /// レジストリのパスワード
        #[arg(long)]
        password: Option<String>,
        /// 認証情報ストアを参照しない
        #[arg(long)]
        no_credential_store: bool,
    },
    /// デプロイメントをクラスタへ配置
    Deploy {
        /// デプロイ対象のデプロイメント（省略時は全デプロイメント）
        #[arg(short = 'n', long)]
        deployment: Option<String>,
        /// kubeconfigのcontext名
        #[arg(long, env = "DECKHAND_KUBE_CONTEXT")]
        kube_context: Option<String>,
        /// 対象のnamespace
        #[arg(long, env = "DECKHAND_NAMESPACE")]
        namespace: Option<String>,
    },
    /// すべてのデプロイメントを削除
    Down {
        /// kubeconfigのcontext名
        #[arg(long, env = "DECKHAND_KUBE_CONTEXT")]
        kube_context: Option<String>,
        /// 対象のnamespace
        #[arg(long, env = "DECKHAND_NAMESPACE")]
        namespace: Option<String>,
    },
    /// デプロイメントの状態を表示
    Status {
        /// kubeconfigのcontext名
        #[arg(long, env = "DECKHAND_KUBE_CONTEXT")]
        kube_context: Option<String>,
        /// 対象のnamespace
        #[arg(long, env = "DECKHAND_NAMESPACE")]
        namespace: Option<String>,
    },
    /// 設定エントリを削除
    #[command(subcommand)]
    Remove(RemoveCommands),
    /// バージョン情報を表示
    Version,
}

/// removeのサブコマンド
#[derive(Subcommand)]
enum RemoveCommands {
    /// 同期パスを設定から削除
    Sync {
        /// ローカルの同期元パス
        #[arg(long)]
        local: Option<String>,
        /// コンテナ内の同期先パス
        #[arg(long)]
        container: Option<String>,
        /// カンマ区切りの key=value セレクタ（例: release=test）
        #[arg(long)]
        selector: Option<String>,
        /// すべての同期パスを削除
        #[arg(long)]
        all: bool,
    },
    /// ポートフォワードを設定から削除
    Port {
        /// 削除するポート番号（例: 8080,3000）
        ports: Option<String>,
        /// カンマ区切りの key=value セレクタ（例: release=test）
        #[arg(long)]
        selector: Option<String>,
        /// すべてのポートフォワードを削除
        #[arg(long)]
        all: bool,
    },
    /// パッケージをデプロイメントから削除
    Package {
        /// パッケージ名
        name: Option<String>,
        /// 対象のデプロイメント名
        #[arg(short = 'd', long)]
        deployment: Option<String>,
        /// すべてのパッケージを削除
        #[arg(long)]
        all: bool,
    },
    /// デプロイメントを設定から削除
    Deployment {
        /// デプロイメント名
        name: Option<String>,
        /// すべてのデプロイメントを削除
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("deckhand {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // 設定ファイルを発見してロード
    let config_path = match deckhand_core::find_config_file() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let mut config = deckhand_core::load_config(&config_path)?;
    let project_root = utils::project_root_of(&config_path);

    // コマンドディスパッチ
    match cli.command {
        Commands::Build {
            image,
            push,
            tag,
            registry,
            username,
            password,
            no_credential_store,
        } => {
            // プロバイダ設定はプッシュ時のトークンフォールバックに使う。
            // 既定のプロバイダ値は起動時に一度だけ構築して渡す
            let providers = ProviderStore::new(default_provider())
                .and_then(|store| store.load())
                .unwrap_or_default();

            commands::build::handle(
                &config,
                &config_path,
                &project_root,
                &providers,
                commands::build::BuildOptions {
                    image,
                    push,
                    tag,
                    registry,
                    username,
                    password,
                    no_credential_store,
                },
            )
            .await?;
        }
        Commands::Deploy {
            deployment,
            kube_context,
            namespace,
        } => {
            let cluster = ClusterHandle::new(kube_context, namespace);
            commands::deploy::handle(
                &config,
                &config_path,
                &project_root,
                &cluster,
                deployment.as_deref(),
            )
            .await?;
        }
        Commands::Down {
            kube_context,
            namespace,
        } => {
            let cluster = ClusterHandle::new(kube_context, namespace);
            commands::down::handle(&config, &config_path, &project_root, &cluster).await?;
        }
        Commands::Status {
            kube_context,
            namespace,
        } => {
            let cluster = ClusterHandle::new(kube_context, namespace);
            commands::status::handle(&config, &config_path, &project_root, &cluster).await?;
        }
        Commands::Remove(remove_cmd) => match remove_cmd {
            RemoveCommands::Sync {
                local,
                container,
                selector,
                all,
            } => {
                commands::remove::handle_sync(
                    &mut config,
                    &config_path,
                    all,
                    local.as_deref(),
                    container.as_deref(),
                    selector.as_deref(),
                )?;
            }
            RemoveCommands::Port {
                ports,
                selector,
                all,
            } => {
                commands::remove::handle_port(
                    &mut config,
                    &config_path,
                    all,
                    selector.as_deref(),
                    ports.as_deref(),
                )?;
            }
            RemoveCommands::Package {
                name,
                deployment,
                all,
            } => {
                commands::remove::handle_package(
                    &mut config,
                    &config_path,
                    all,
                    deployment.as_deref(),
                    name.as_deref(),
                )?;
            }
            RemoveCommands::Deployment { name, all } => {
                commands::remove::handle_deployment(
                    &mut config,
                    &config_path,
                    all,
                    name.as_deref(),
                )?;
            }
        },
        Commands::Version => {
            unreachable!("Version is handled before config loading");
        }
    }

    Ok(())
}
