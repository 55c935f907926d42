//! Interactive console mode

use console::style;
use indicatif::ProgressBar;
use navigation::{DenyReason, Navigation, Navigator, RedirectIntent};
use session::{InMemoryIdentityService, SeedFile, SessionStore};
use shared::{AccessConfig, Credentials, Logger, TracingLogger};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Interactive console driving one session
pub struct InteractiveCli {
    service: Arc<InMemoryIdentityService>,
    navigator: Navigator,
    location: String,
    /// Where to go after signing in
    pending: Option<RedirectIntent>,
    /// What the unauthorized screen offers to retry
    denied: Option<RedirectIntent>,
}

impl InteractiveCli {
    pub fn new(config: &AccessConfig, seed: SeedFile) -> anyhow::Result<Self> {
        let logger: Arc<dyn Logger> = Arc::new(TracingLogger);
        let service = Arc::new(seed.into_service()?);
        let store = SessionStore::new(service.clone(), &config.session, logger.clone());
        let navigator = Navigator::new(Arc::new(store), config, logger)?;

        Ok(Self {
            service,
            navigator,
            location: config.routes.landing_path.clone(),
            pending: None,
            denied: None,
        })
    }

    /// Run the console until /quit or end of input
    pub async fn run(&mut self) -> anyhow::Result<()> {
        println!("{}", style("ClinicDesk Interactive Mode").bold());
        println!("Type /help for commands, /quit to exit");
        println!();

        let pb = spinner("Restoring session...");
        self.navigator.bootstrap().await;
        pb.finish_and_clear();

        let landing = self.location.clone();
        let nav = self.navigator.navigate_when_resolved(&landing).await;
        self.show(nav);

        loop {
            print!("{} > ", self.prompt());
            io::stdout().flush()?;

            let mut input = String::new();
            if io::stdin().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();

            if input.is_empty() {
                continue;
            }

            if !input.starts_with('/') {
                println!("Commands and locations start with '/'. Type /help for commands.");
                continue;
            }

            match self.handle_command(input).await {
                Ok(true) => break,
                Ok(false) => continue,
                Err(e) => {
                    println!("{} {}", style("Error:").red(), e);
                    continue;
                }
            }
        }

        Ok(())
    }

    fn prompt(&self) -> String {
        let snapshot = self.navigator.snapshot();
        let who = snapshot
            .identity()
            .map(|i| i.display_name.clone())
            .unwrap_or_else(|| "signed out".to_string());
        format!("[{}] {}", who, self.location)
    }

    async fn handle_command(&mut self, input: &str) -> anyhow::Result<bool> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "/quit" | "/exit" | "/q" => {
                println!("Goodbye!");
                return Ok(true);
            }
            "/help" | "/h" => {
                println!("Commands:");
                println!("  /login [user] [password] - Sign in and resume");
                println!("  /logout                  - Sign out");
                println!("  /go <path>, <path>       - Navigate to a screen");
                println!("  /retry                   - Try the denied screen again");
                println!("  /menu [all]              - Show the main menu, or every screen's decision");
                println!("  /whoami                  - Show the current identity");
                println!("  /refresh                 - Re-fetch identity and capabilities");
                println!("  /audit [json]            - Show recent audit entries, or export them");
                println!("  /offline on|off          - Simulate losing the identity service");
                println!("  /quit                    - Exit");
            }
            "/login" => {
                self.login(parts.get(1).copied(), parts.get(2).copied())
                    .await?;
            }
            "/logout" => {
                let nav = self.navigator.sign_out().await;
                self.pending = None;
                self.denied = None;
                println!("Signed out");
                self.show(nav);
            }
            "/go" => match parts.get(1) {
                Some(location) => {
                    let nav = self.navigator.navigate(location);
                    self.show(nav);
                }
                None => println!("Usage: /go <path>"),
            },
            "/retry" => match self.denied.take() {
                Some(intent) => {
                    let nav = self.navigator.retry(intent);
                    self.show(nav);
                }
                None => println!("Nothing to retry"),
            },
            "/menu" if parts.get(1) == Some(&"all") => {
                for line in self.decision_lines() {
                    println!("  {}", line);
                }
            }
            "/menu" => {
                let menu = self.navigator.menu();
                if menu.is_empty() {
                    println!("  (no entries)");
                }
                for entry in menu {
                    println!("  {:<16} {}", entry.path, entry.title);
                }
            }
            "/whoami" => self.whoami(),
            "/refresh" => {
                let pb = spinner("Refreshing identity...");
                let result = self.navigator.refresh_identity().await;
                pb.finish_and_clear();

                match result {
                    Ok(Some(identity)) => {
                        println!(
                            "Refreshed: {} ({})",
                            identity.display_name,
                            identity.capabilities()
                        );
                        // Capabilities may have shrunk under the current screen
                        let location = self.location.clone();
                        let nav = self.navigator.navigate(&location);
                        self.show(nav);
                    }
                    Ok(None) => println!("Not signed in"),
                    Err(e) => println!(
                        "{} {} (keeping current capabilities)",
                        style("Refresh failed:").yellow(),
                        e
                    ),
                }
            }
            "/audit" if parts.get(1) == Some(&"json") => {
                println!("{}", self.audit_json()?);
            }
            "/audit" => {
                for entry in self.navigator.recent_audit(10) {
                    println!(
                        "  {} {:?} {} {}",
                        entry.timestamp,
                        entry.event_type,
                        entry.location.as_deref().unwrap_or("-"),
                        entry.reason.as_deref().unwrap_or("")
                    );
                }
            }
            "/offline" => match parts.get(1).copied() {
                Some("on") => {
                    self.service.set_offline(true);
                    println!("Identity service offline");
                }
                Some("off") => {
                    self.service.set_offline(false);
                    println!("Identity service online");
                }
                _ => println!("Usage: /offline on|off"),
            },
            // Anything else naming a screen is a location
            _ if self.navigator.screens().resolve(cmd).is_some() => {
                let nav = self.navigator.navigate(cmd);
                self.show(nav);
            }
            _ => {
                println!("Unknown command: {}", cmd);
            }
        }

        Ok(false)
    }

    async fn login(&mut self, username: Option<&str>, password: Option<&str>) -> anyhow::Result<()> {
        let username = match username {
            Some(username) => username.to_string(),
            None => dialoguer::Input::<String>::new()
                .with_prompt("Username")
                .interact_text()?,
        };
        let password = match password {
            Some(password) => password.to_string(),
            None => dialoguer::Password::new()
                .with_prompt("Password")
                .interact()?,
        };
        let credentials = Credentials::new(username, password);

        let pb = spinner("Signing in...");
        let result = self.navigator.sign_in(&credentials, &mut self.pending).await;
        pb.finish_and_clear();

        match result {
            Ok(nav) => {
                self.denied = None;
                self.show(nav);
            }
            Err(e) if e.is_authentication() => {
                println!("{}", style("Invalid username or password").red());
            }
            Err(e) if e.is_retryable() => {
                println!("{} {}. Try again.", style("Service unavailable:").yellow(), e);
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// One line per gated screen with its guard decision
    fn decision_lines(&self) -> Vec<String> {
        self.navigator
            .screen_decisions()
            .into_iter()
            .map(|d| format!("{:<14} {:<16} {}", d.screen.id, d.screen.path, d.decision))
            .collect()
    }

    fn audit_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.navigator.export_audit())?)
    }

    fn whoami(&self) {
        let snapshot = self.navigator.snapshot();
        let Some(identity) = snapshot.identity() else {
            println!("Not signed in");
            return;
        };

        println!("{} ({})", style(&identity.display_name).bold(), identity.id);
        println!("  Role: {} ({})", identity.role.name, identity.role.id);
        println!("  Capabilities: {}", identity.capabilities());
        if let Some(profile) = &identity.profile {
            if let Some(specialty) = &profile.specialty {
                println!("  Specialty: {}", specialty);
            }
            if let Some(license) = &profile.license_id {
                println!("  License: {}", license);
            }
            if !profile.shifts.is_empty() {
                println!("  Shifts: {}", profile.shifts.join(", "));
            }
        }
    }

    fn show(&mut self, nav: Navigation) {
        match nav {
            Navigation::Render {
                screen_id,
                location,
            } => {
                let title = self
                    .navigator
                    .screens()
                    .get(&screen_id)
                    .map(|s| s.title.clone())
                    .unwrap_or(screen_id);
                println!("{} {}", style("→").green(), style(title).bold());
                self.location = location;
            }
            Navigation::Loading { location } => {
                println!("{} {}", style("…").dim(), location);
            }
            Navigation::Redirect { to, reason, intent } => {
                match reason {
                    DenyReason::Unauthenticated => {
                        println!("Sign in to continue to {}", intent.location());
                        self.pending = Some(intent);
                    }
                    DenyReason::Forbidden => {
                        println!(
                            "{} {} (use /retry after your role changes)",
                            style("Not authorized for").red(),
                            intent.location()
                        );
                        self.denied = Some(intent);
                    }
                }
                self.location = to;
            }
            Navigation::NotFound { location } => {
                println!("{} {}", style("No screen at").yellow(), location);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_cli() -> InteractiveCli {
        InteractiveCli::new(&AccessConfig::default(), SeedFile::demo().unwrap()).unwrap()
    }

    // ============== Basic Creation Tests ==============

    #[test]
    fn test_new_cli() {
        let cli = create_cli();
        assert_eq!(cli.location, "/");
        assert!(cli.pending.is_none());
        assert!(cli.denied.is_none());
        assert!(cli.prompt().contains("signed out"));
    }

    // ============== Command Handling Tests ==============

    #[tokio::test]
    async fn test_handle_quit_command() {
        let mut cli = create_cli();
        assert!(cli.handle_command("/quit").await.unwrap());
        assert!(cli.handle_command("/q").await.unwrap());
    }

    #[tokio::test]
    async fn test_handle_help_and_unknown() {
        let mut cli = create_cli();
        assert!(!cli.handle_command("/help").await.unwrap());
        assert!(!cli.handle_command("/unknown").await.unwrap());
        assert_eq!(cli.location, "/");
        assert!(cli.pending.is_none());
    }

    #[tokio::test]
    async fn test_typed_location_navigates() {
        let mut cli = create_cli();
        cli.handle_command("/owners/7?tab=pets").await.unwrap();

        assert_eq!(cli.location, "/login");
        assert_eq!(
            cli.pending.as_ref().map(|i| i.location()),
            Some("/owners/7?tab=pets")
        );

        cli.handle_command("/login ana ana").await.unwrap();
        assert_eq!(cli.location, "/owners/7?tab=pets");

        cli.handle_command("/").await.unwrap();
        assert_eq!(cli.location, "/");
    }

    #[tokio::test]
    async fn test_go_while_signed_out_holds_intent() {
        let mut cli = create_cli();
        cli.handle_command("/go /owners").await.unwrap();

        assert_eq!(cli.location, "/login");
        assert_eq!(cli.pending.as_ref().map(|i| i.location()), Some("/owners"));
    }

    #[tokio::test]
    async fn test_login_resumes_pending_location() {
        let mut cli = create_cli();
        cli.handle_command("/go /owners/12").await.unwrap();
        cli.handle_command("/login ana ana").await.unwrap();

        assert_eq!(cli.location, "/owners/12");
        assert!(cli.pending.is_none());
        assert!(cli.prompt().contains("Ana Torres"));
    }

    #[tokio::test]
    async fn test_bad_password_keeps_pending() {
        let mut cli = create_cli();
        cli.handle_command("/go /animals").await.unwrap();
        cli.handle_command("/login ana nope").await.unwrap();

        assert_eq!(cli.location, "/login");
        assert!(cli.pending.is_some());
    }

    #[tokio::test]
    async fn test_offline_login_keeps_pending() {
        let mut cli = create_cli();
        cli.handle_command("/go /animals").await.unwrap();
        cli.handle_command("/offline on").await.unwrap();
        cli.handle_command("/login ana ana").await.unwrap();

        assert!(cli.pending.is_some());
        assert!(!cli.navigator.snapshot().is_authenticated());

        cli.handle_command("/offline off").await.unwrap();
        cli.handle_command("/login ana ana").await.unwrap();
        assert_eq!(cli.location, "/animals");
    }

    #[tokio::test]
    async fn test_forbidden_then_retry() {
        let mut cli = create_cli();
        cli.handle_command("/login leo leo").await.unwrap();
        assert_eq!(cli.location, "/");

        cli.handle_command("/go /users").await.unwrap();
        assert_eq!(cli.location, "/unauthorized");
        assert!(cli.denied.is_some());

        // Still forbidden; the retry re-arms the intent
        cli.handle_command("/retry").await.unwrap();
        assert_eq!(cli.location, "/unauthorized");
        assert!(cli.denied.is_some());
    }

    #[tokio::test]
    async fn test_retry_without_denial() {
        let mut cli = create_cli();
        assert!(!cli.handle_command("/retry").await.unwrap());
        assert_eq!(cli.location, "/");
    }

    #[tokio::test]
    async fn test_logout_clears_intents() {
        let mut cli = create_cli();
        cli.handle_command("/login leo leo").await.unwrap();
        cli.handle_command("/go /owners").await.unwrap();
        cli.handle_command("/logout").await.unwrap();

        assert_eq!(cli.location, "/login");
        assert!(cli.denied.is_none());
        assert!(cli.pending.is_none());
    }

    #[tokio::test]
    async fn test_refresh_revokes_current_screen() {
        let mut cli = create_cli();
        cli.handle_command("/login ana ana").await.unwrap();
        cli.handle_command("/go /owners").await.unwrap();
        assert_eq!(cli.location, "/owners");

        cli.service
            .set_role_capabilities("reception", shared::CapabilitySet::new())
            .unwrap();
        cli.handle_command("/refresh").await.unwrap();

        assert_eq!(cli.location, "/unauthorized");
    }

    #[tokio::test]
    async fn test_informational_commands() {
        let mut cli = create_cli();
        cli.handle_command("/login ruiz ruiz").await.unwrap();

        assert!(!cli.handle_command("/menu").await.unwrap());
        assert!(!cli.handle_command("/whoami").await.unwrap());
        assert!(!cli.handle_command("/audit").await.unwrap());
        assert!(!cli.handle_command("/go").await.unwrap());
        assert!(!cli.handle_command("/offline").await.unwrap());
    }

    // ============== Inspection Tests ==============

    #[tokio::test]
    async fn test_menu_all_lists_every_decision() {
        let mut cli = create_cli();
        cli.handle_command("/login ana ana").await.unwrap();

        let lines = cli.decision_lines();
        assert!(lines.iter().any(|l| l.starts_with("owners") && l.ends_with("allow")));
        assert!(lines.iter().any(|l| l.starts_with("users") && l.ends_with("deny (forbidden)")));
        assert!(!lines.iter().any(|l| l.starts_with("login")));
        assert!(!cli.handle_command("/menu all").await.unwrap());
    }

    #[tokio::test]
    async fn test_audit_json_export() {
        let mut cli = create_cli();
        cli.handle_command("/login ana nope").await.unwrap();
        cli.handle_command("/login ana ana").await.unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&cli.audit_json().unwrap()).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
        assert!(!cli.handle_command("/audit json").await.unwrap());
    }
}
