//! Portal navigation shared by the workflows.

use crate::app::AppProfile;
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::wait::WaitCondition;
use std::time::Duration;

/// Entry points into the application's areas
#[derive(Debug, Clone)]
pub struct Portal {
    app: AppProfile,
}

impl Portal {
    /// Portal for `app`
    #[must_use]
    pub const fn new(app: AppProfile) -> Self {
        Self { app }
    }

    /// Application profile
    #[must_use]
    pub const fn app(&self) -> &AppProfile {
        &self.app
    }

    /// Load the landing page and wait for its title
    pub async fn open_home(&self, session: &mut Session) -> ProbeResult<()> {
        session.goto(&self.app.base_url).await?;
        let timeout = session.timeouts().element;
        session
            .wait_until(&self.app.home.title, WaitCondition::Visible, timeout)
            .await?;
        Ok(())
    }

    /// Enter the manager area from the landing page
    pub async fn as_manager(&self, session: &mut Session) -> ProbeResult<()> {
        self.open_home(session).await?;
        session.click(&self.app.home.manager_login).await
    }

    /// Enter the manager area unless already there
    pub async fn ensure_manager(&self, session: &mut Session) -> ProbeResult<()> {
        if session
            .probe(&self.app.manager.add_customer_tab, WaitCondition::Visible, Duration::ZERO)
            .await?
            .is_none()
        {
            self.as_manager(session).await?;
        }
        Ok(())
    }

    /// Log in as `name` unless that customer's dashboard is already showing
    pub async fn ensure_customer(&self, session: &mut Session, name: &str) -> ProbeResult<String> {
        let welcome = &self.app.customer.welcome;
        if session
            .probe(welcome, WaitCondition::Visible, Duration::ZERO)
            .await?
            .is_some()
        {
            let text = session.read_text(welcome).await?;
            if text.contains(name) {
                return Ok(text);
            }
            self.logout(session).await?;
        }
        self.login_customer(session, name).await
    }

    /// Log in as `name`; returns the welcome banner text
    pub async fn login_customer(&self, session: &mut Session, name: &str) -> ProbeResult<String> {
        let customer = &self.app.customer;
        self.open_home(session).await?;
        session.click(&self.app.home.customer_login).await?;
        session.select(&customer.user_select, name).await?;
        session.click(&customer.login_button).await?;
        let welcome = session.read_text(&customer.welcome).await?;
        tracing::info!(customer = name, welcome = %welcome, "customer logged in");
        Ok(welcome)
    }

    /// Click logout
    pub async fn logout(&self, session: &mut Session) -> ProbeResult<()> {
        session.click(&self.app.customer.logout).await?;
        tracing::info!("customer logged out");
        Ok(())
    }

    /// Protected dashboard marker, if reachable within `timeout`.
    ///
    /// The welcome banner is the marker; a visible deposit tab counts too.
    pub async fn dashboard_marker(
        &self,
        session: &mut Session,
        timeout: Duration,
    ) -> ProbeResult<Option<String>> {
        let customer = &self.app.customer;
        if session
            .probe(&customer.welcome, WaitCondition::Visible, timeout)
            .await?
            .is_some()
        {
            return Ok(Some(session.read_text(&customer.welcome).await?));
        }
        if session
            .probe(&customer.deposit_tab, WaitCondition::Visible, Duration::ZERO)
            .await?
            .is_some()
        {
            return Ok(Some(session.read_text(&customer.deposit_tab).await?));
        }
        Ok(None)
    }

    /// Balance shown on the account summary
    pub async fn balance(&self, session: &mut Session) -> ProbeResult<u64> {
        let text = session.read_text(&self.app.customer.balance_panel).await?;
        parse_balance(&text)
            .ok_or_else(|| ProbeError::driver(format!("no balance in {text:?}")))
    }
}

/// Digits following `Balance :` in an account summary line
pub(crate) fn parse_balance(text: &str) -> Option<u64> {
    let (_, rest) = text.split_once("Balance")?;
    let digits: String = rest
        .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_balance() {
        assert_eq!(
            parse_balance("Account Number : 1004 , Balance : 150 , Currency : Dollar"),
            Some(150)
        );
        assert_eq!(parse_balance("Balance:0"), Some(0));
        assert_eq!(parse_balance("Balance : , Currency"), None);
        assert_eq!(parse_balance("Currency : Dollar"), None);
    }
}
