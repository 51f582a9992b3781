//! nginx site definition for the static frontend and the `/api` backend.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::ProxyConfig;
use crate::exec::{execute, Runner};
use crate::system::{install_file, systemctl, Privilege};

pub fn render_site(static_root: &Path, listen_port: u16, backend_port: u16) -> String {
    format!(
        "server {{
    listen {listen_port};

    location / {{
        root {root};
        index index.html;
    }}

    location /api {{
        proxy_pass http://127.0.0.1:{backend_port}/;
        proxy_http_version 1.1;
        proxy_set_header Upgrade $http_upgrade;
        proxy_set_header Connection 'upgrade';
        proxy_set_header Host $host;
        proxy_cache_bypass $http_upgrade;
    }}
}}
",
        root = static_root.display(),
    )
}

#[derive(Debug)]
pub struct ProxyPaths {
    pub available: PathBuf,
    pub enabled: PathBuf,
}

pub fn site_paths(proxy: &ProxyConfig) -> ProxyPaths {
    ProxyPaths {
        available: proxy.sites_available.join(&proxy.site_name),
        enabled: proxy.sites_enabled.join(&proxy.site_name),
    }
}

/// Installs the site, enables it, validates the full nginx config and
/// reloads. A failed validation returns before the reload is issued.
pub fn configure_proxy(
    runner: &dyn Runner,
    privilege: &Privilege,
    proxy: &ProxyConfig,
    static_root: &Path,
    backend_port: u16,
) -> Result<ProxyPaths> {
    let site = render_site(static_root, proxy.listen_port, backend_port);
    let paths = site_paths(proxy);

    install_file(runner, privilege, &site, &paths.available)?;

    let link = privilege.command(
        "ln",
        [
            OsString::from("-sf"),
            paths.available.as_os_str().to_owned(),
            paths.enabled.as_os_str().to_owned(),
        ],
    );
    execute(runner, &link)?;

    execute(runner, &privilege.command("nginx", ["-t"]))
        .context("nginx rejected the configuration; not reloading")?;
    systemctl(runner, privilege, &["reload", "nginx"])?;

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeRunner;

    #[test]
    fn renders_site_definition() {
        let site = render_site(Path::new("/srv/app/frontend/dist"), 80, 8000);
        insta::assert_snapshot!(site, @r"
        server {
            listen 80;

            location / {
                root /srv/app/frontend/dist;
                index index.html;
            }

            location /api {
                proxy_pass http://127.0.0.1:8000/;
                proxy_http_version 1.1;
                proxy_set_header Upgrade $http_upgrade;
                proxy_set_header Connection 'upgrade';
                proxy_set_header Host $host;
                proxy_cache_bypass $http_upgrade;
            }
        }
        ");
    }

    #[test]
    fn configure_runs_install_link_validate_reload_in_order() {
        let runner = FakeRunner::new();
        configure_proxy(
            &runner,
            &Privilege::new("sudo"),
            &ProxyConfig::default(),
            Path::new("/srv/app/frontend/dist"),
            8000,
        )
        .unwrap();

        let lines = runner.lines();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with(" /etc/nginx/sites-available/fastapi-frontend"));
        assert_eq!(
            lines[1],
            "sudo ln -sf /etc/nginx/sites-available/fastapi-frontend /etc/nginx/sites-enabled/fastapi-frontend"
        );
        assert_eq!(lines[2], "sudo nginx -t");
        assert_eq!(lines[3], "sudo systemctl reload nginx");
    }

    #[test]
    fn failed_validation_never_reloads() {
        let runner = FakeRunner::failing_on("nginx -t");
        let err = configure_proxy(
            &runner,
            &Privilege::new("sudo"),
            &ProxyConfig::default(),
            Path::new("/srv/app/frontend/dist"),
            8000,
        )
        .unwrap_err();

        assert!(err.to_string().contains("not reloading"), "{}", err);
        assert!(runner.ran("nginx -t"));
        assert!(!runner.ran("systemctl reload"));
    }
}
