use crate::docker;
use crate::utils;
use colored::Colorize;
use deckhand_build::{ImageBuilder, ImagePusher, ImageReference, RegistryAuth, TerminalSink};
use deckhand_cloud::ProviderConfig;
use deckhand_core::{BuildConfig, Config, ImageConfig};
use std::path::Path;

/// ビルドコマンドのオプション
pub struct BuildOptions {
    /// ビルド対象のイメージ名（省略時は全イメージ）
    pub image: Option<String>,
    /// ビルド後にレジストリへプッシュ
    pub push: bool,
    /// イメージタグの上書き
    pub tag: Option<String>,
    /// レジストリURLの上書き
    pub registry: Option<String>,
    /// 明示的なユーザー名（ストアに認証情報がない場合のフォールバック）
    pub username: Option<String>,
    /// 明示的なパスワード
    pub password: Option<String>,
    /// 認証情報ストアを参照しない
    pub no_credential_store: bool,
}

/// ビルド済みイメージ（プッシュ工程へ引き継ぐ情報）
struct BuiltImage {
    name: String,
    full_image: String,
    registry: Option<String>,
    use_credential_store: bool,
}

/// ビルドコマンドを処理
pub async fn handle(
    config: &Config,
    config_path: &Path,
    project_root: &Path,
    providers: &ProviderConfig,
    options: BuildOptions,
) -> anyhow::Result<()> {
    println!("{}", "Dockerイメージをビルド中...".green());
    utils::print_loaded_config(config_path);

    // ビルド対象のイメージを決定（build 設定があるもののみ）
    let target_images: Vec<(&String, &ImageConfig, &BuildConfig)> = config
        .images
        .iter()
        .filter(|(name, _)| options.image.as_ref().is_none_or(|filter| filter == *name))
        .filter_map(|(name, image)| image.build.as_ref().map(|build| (name, image, build)))
        .collect();

    if let Some(filter) = &options.image
        && target_images.is_empty()
    {
        return Err(anyhow::anyhow!(
            "イメージ '{}' が見つからないか、build 設定がありません",
            filter
        ));
    }

    if target_images.is_empty() {
        println!(
            "{}",
            "ビルド対象のイメージがありません（build 設定が必要です）".yellow()
        );
        return Ok(());
    }

    println!();
    println!(
        "{}",
        format!("ビルド対象イメージ ({} 個):", target_images.len()).bold()
    );
    for (name, _, _) in &target_images {
        println!("  • {}", name.cyan());
    }

    // Docker接続
    println!();
    println!("{}", "Dockerに接続中...".blue());
    let docker_conn = docker::init_docker_with_error_handling().await?;

    let builder = ImageBuilder::new(docker_conn.clone());
    let pusher = if options.push {
        Some(ImagePusher::new(docker_conn.clone()))
    } else {
        None
    };

    // 設定済みの全レジストリの認証情報を収集してビルドに添付する。
    // マルチステージビルドがプライベートなベースイメージを参照しても
    // 成功するように、対象レジストリ分だけでは足りない
    let store = RegistryAuth::new();
    let registry_auths = store.all_credentials();
    if !registry_auths.is_empty() {
        tracing::debug!(
            "Attaching credentials for {} registries to build requests",
            registry_auths.len()
        );
    }

    // ビルド結果を格納
    let mut built_images: Vec<BuiltImage> = Vec::new();

    for (image_name, image_config, build) in &target_images {
        println!();
        println!(
            "{}",
            format!("🔨 {} をビルド中...", image_name).green().bold()
        );

        let dockerfile_path = project_root.join(
            build
                .dockerfile
                .as_deref()
                .unwrap_or(Path::new("Dockerfile")),
        );
        let context_path = project_root.join(build.context.as_deref().unwrap_or(Path::new(".")));

        // レジストリ優先順位: CLI > Image > Config
        let effective_registry = options
            .registry
            .as_deref()
            .or(image_config.registry.as_deref())
            .or(config.registry.as_deref());

        let tag = options.tag.as_deref().unwrap_or(image_config.tag());
        let reference = ImageReference {
            registry: effective_registry.map(str::to_string),
            repository: image_config.image.clone(),
            tag: tag.to_string(),
        };
        let full_image = reference.familiar();

        println!(
            "  → Dockerfile: {}",
            dockerfile_path.display().to_string().cyan()
        );
        println!("  → Context: {}", context_path.display().to_string().cyan());
        println!("  → Image: {}", full_image.cyan());

        let mut sink = TerminalSink::new();
        match builder
            .build(
                &context_path,
                &dockerfile_path,
                &full_image,
                &build.args,
                registry_auths.clone(),
                &mut sink,
            )
            .await
        {
            Ok(_) => {
                println!("  {} ビルド完了", "✓".green());
                built_images.push(BuiltImage {
                    name: image_name.to_string(),
                    full_image,
                    registry: effective_registry.map(str::to_string),
                    use_credential_store: !options.no_credential_store
                        && image_config.use_credential_store,
                });
            }
            Err(e) => {
                eprintln!("  {} ビルドエラー: {}", "✗".red().bold(), e.user_message());
                return Err(anyhow::anyhow!("ビルドに失敗しました"));
            }
        }
    }

    // プッシュ処理
    if let Some(pusher) = pusher {
        println!();
        println!("{}", "📤 イメージをプッシュ中...".blue().bold());

        for built in &built_images {
            println!();
            println!("{}", format!("Pushing {}...", built.name).blue());

            // 明示的な認証情報（プロバイダのトークンを含む）を決定
            let (username, password) = explicit_credentials(
                providers,
                built.registry.as_deref(),
                options.username.as_deref(),
                options.password.as_deref(),
            );

            let authenticated = match pusher
                .authenticate(
                    built.registry.as_deref(),
                    &built.full_image,
                    &username,
                    &password,
                    built.use_credential_store,
                )
                .await
            {
                Ok(authenticated) => authenticated,
                Err(e) => {
                    eprintln!("  {} 認証エラー: {}", "✗".red().bold(), e);
                    return Err(anyhow::anyhow!("レジストリ認証に失敗しました"));
                }
            };

            let mut sink = TerminalSink::new();
            match pusher.push(&built.full_image, &authenticated, &mut sink).await {
                Ok(pushed_image) => {
                    println!("  {} {}", "✓".green(), pushed_image.cyan());
                }
                Err(e) => {
                    eprintln!("  {} プッシュエラー: {}", "✗".red().bold(), e);
                    return Err(anyhow::anyhow!("プッシュに失敗しました"));
                }
            }
        }
    }

    // 完了メッセージ
    println!();
    if options.push {
        println!(
            "{}",
            "✓ すべてのイメージがビルド＆プッシュされました！"
                .green()
                .bold()
        );
    } else {
        println!(
            "{}",
            "✓ すべてのイメージがビルドされました！".green().bold()
        );
    }

    // 結果サマリー
    println!();
    println!("{}", "結果サマリー:".bold());
    for built in &built_images {
        println!(
            "  {} {}: {}",
            "✓".green(),
            built.name,
            built.full_image.cyan()
        );
    }

    Ok(())
}

/// 明示的なフォールバック認証情報を決定
///
/// CLIでユーザー名/パスワードが渡されていればそれを使う。
/// 無い場合、対象レジストリがプロバイダ設定のホストに一致すれば
/// そのトークンをパスワードとして使う。
fn explicit_credentials(
    providers: &ProviderConfig,
    registry: Option<&str>,
    username: Option<&str>,
    password: Option<&str>,
) -> (String, String) {
    if username.is_some() || password.is_some() {
        return (
            username.unwrap_or_default().to_string(),
            password.unwrap_or_default().to_string(),
        );
    }

    if let Some(registry) = registry {
        for provider in providers.values() {
            let Some(host) = &provider.host else { continue };
            if provider.token.is_empty() {
                continue;
            }
            let host = host
                .split_once("://")
                .map(|(_, rest)| rest)
                .unwrap_or(host)
                .trim_end_matches('/');
            if host == registry {
                tracing::debug!("Using provider '{}' token for {}", provider.name, registry);
                return ("token".to_string(), provider.token.clone());
            }
        }
    }

    (String::new(), String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_cloud::Provider;

    fn providers_with(host: &str, token: &str) -> ProviderConfig {
        let mut providers = ProviderConfig::new();
        providers.insert(
            "my-company".to_string(),
            Provider {
                name: "my-company".to_string(),
                host: Some(host.to_string()),
                token: token.to_string(),
            },
        );
        providers
    }

    #[test]
    fn test_explicit_credentials_prefer_cli_input() {
        let providers = providers_with("https://registry.example.com", "tok");
        let (user, pass) = explicit_credentials(
            &providers,
            Some("registry.example.com"),
            Some("mito"),
            Some("secret"),
        );
        assert_eq!(user, "mito");
        assert_eq!(pass, "secret");
    }

    #[test]
    fn test_explicit_credentials_from_provider_token() {
        let providers = providers_with("https://registry.example.com/", "tok-1");
        let (user, pass) =
            explicit_credentials(&providers, Some("registry.example.com"), None, None);
        assert_eq!(user, "token");
        assert_eq!(pass, "tok-1");
    }

    #[test]
    fn test_explicit_credentials_empty_without_match() {
        let providers = providers_with("https://other.example.com", "tok");
        let (user, pass) = explicit_credentials(&providers, Some("ghcr.io"), None, None);
        assert!(user.is_empty());
        assert!(pass.is_empty());
    }
}
