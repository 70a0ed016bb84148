//! The login-flow suite.
//!
//! Navigation cases run once per viewport profile. Login page cases start
//! on the identity provider's email step. Every case body only talks to the
//! page through an origin scope.

use crate::device::ViewportProfile;
use crate::fixture::FixtureName;
use crate::harness::{CaseFuture, TestGroup, TestSuite};
use crate::result::ProbeResult;
use crate::selectors::{prefilled_field, Element};
use crate::session::{OriginScope, Session};

const ERROR_RED: &str = "rgb(232, 28, 0)";
const REQUIRED_FIELD: &str = "Please fill out this field.";

/// The complete login-flow suite
#[must_use]
pub fn login_suite() -> TestSuite {
    let mut suite = TestSuite::new("Login Flow");
    for profile in ViewportProfile::NAVIGATION {
        suite = suite.with_group(navigation_group(profile));
    }
    suite.with_group(login_page_group()).with_group(
        TestGroup::new("Successful Login").with_case(
            "should navigate to dashboard with valid credentials",
            successful_login,
        ),
    )
}

fn navigation_group(profile: ViewportProfile) -> TestGroup {
    TestGroup::new(format!("Navigation to Login Page - {}", profile.name))
        .with_viewport(profile)
        .with_before_each(visit_home)
        .with_case(
            "should display the login sub nav when clicking the login button",
            sub_nav_visible,
        )
        .with_case(
            "should display the Hudl login link in the sub nav",
            login_link_visible,
        )
        .with_case(
            "should navigate to the login page when clicking the Hudl login link",
            lands_on_login_page,
        )
        .with_case(
            "should keep the sub nav open when the login button is clicked twice",
            menu_stays_open,
        )
}

fn login_page_group() -> TestGroup {
    TestGroup::new("Login Page")
        .with_before_each(open_login_page)
        .with_case("should have an email field with proper label", email_field)
        .with_case("should have a continue button", continue_button)
        .with_case("should validate required email field", required_email)
        .with_case("should show error for invalid email format", invalid_email_format)
        .with_case(
            "should display password field after submitting valid email",
            password_step_after_email,
        )
        .with_case(
            "should show error for invalid credentials (registered email)",
            registered_wrong_password,
        )
        .with_case(
            "should show error for invalid credentials (unregistered email)",
            unregistered_email,
        )
        .with_case(
            "should show error for invalid credentials (no password)",
            missing_password,
        )
}

// hooks

fn visit_home(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let home = s.config().app_url.clone();
        s.visit(&home).await
    })
}

fn open_login_page(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move { s.flow().open_login_entry().await.map(|_| ()) })
}

// shared assertions

async fn expect_single_required_field(idp: &OriginScope<'_>) -> ProbeResult<()> {
    idp.get(Element::InvalidInput)
        .await?
        .to_have_count(1)
        .await?
        .to_have_validation_message(REQUIRED_FIELD)
        .await?
        .to_have_validity(true, false)
        .await?;
    Ok(())
}

async fn expect_password_error(idp: &OriginScope<'_>, message: &str) -> ProbeResult<()> {
    idp.get(Element::PasswordError)
        .await?
        .to_be_visible()
        .await?
        .to_have_color(ERROR_RED)
        .await?
        .to_contain_text(message)
        .await?;
    idp.get(Element::ErrorIcon)
        .await?
        .to_be_visible()
        .await?
        .to_have_color(ERROR_RED)
        .await?;
    Ok(())
}

// navigation

fn sub_nav_visible(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        s.flow().open_login_menu().await?;
        s.app()
            .await?
            .get(Element::SubNavMenu)
            .await?
            .to_be_visible()
            .await?;
        Ok(())
    })
}

fn login_link_visible(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        s.flow().open_login_menu().await?;
        s.app()
            .await?
            .get(Element::LoginLink)
            .await?
            .to_be_visible()
            .await?;
        Ok(())
    })
}

fn lands_on_login_page(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        s.flow().navigate_to_login_page().await?;
        let idp = s.identity().await?;
        idp.expect_url_contains("/login").await?;
        idp.get(Element::Heading).await?.to_have_text("Log In").await?;
        Ok(())
    })
}

fn menu_stays_open(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let mut flow = s.flow();
        flow.open_login_menu().await?;
        flow.open_login_menu().await?;
        s.app()
            .await?
            .get(Element::SubNavMenu)
            .await?
            .to_be_visible()
            .await?;
        Ok(())
    })
}

// login page

fn email_field(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let idp = s.identity().await?;
        idp.get(Element::EmailField)
            .await?
            .to_be_visible()
            .await?
            .to_be_enabled()
            .await?;
        idp.get(Element::EmailLabel)
            .await?
            .to_contain_text("Email*")
            .await?;
        Ok(())
    })
}

fn continue_button(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        s.identity()
            .await?
            .get(Element::ContinueButton)
            .await?
            .to_be_visible()
            .await?;
        Ok(())
    })
}

fn required_email(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let idp = s.identity().await?;
        expect_single_required_field(&idp).await
    })
}

fn invalid_email_format(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let email = s.fixture(FixtureName::InvalidEmail)?;
        let mut idp = s.identity().await?;
        idp.type_into(Element::EmailField, &email).await?;
        idp.click(Element::ContinueButton).await?;
        idp.get(Element::EmailError)
            .await?
            .to_be_visible()
            .await?
            .to_contain_text("Enter a valid email")
            .await?
            .to_have_color(ERROR_RED)
            .await?;
        idp.get(Element::ErrorIcon)
            .await?
            .to_be_visible()
            .await?
            .to_have_color(ERROR_RED)
            .await?;
        Ok(())
    })
}

fn password_step_after_email(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let email = s.fixture(FixtureName::GenericEmail)?;
        s.flow().submit_email(&email).await?;
        let idp = s.identity().await?;
        idp.get(Element::PasswordField).await?.to_be_visible().await?;
        idp.locate(prefilled_field(&email))
            .await?
            .to_be_readonly()
            .await?;
        Ok(())
    })
}

fn registered_wrong_password(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let email = s.fixture(FixtureName::ValidEmail)?;
        let password = s.fixture(FixtureName::InvalidPassword)?;
        let mut flow = s.flow();
        flow.submit_email(&email).await?;
        flow.submit_password(&password).await?;
        let idp = s.identity().await?;
        expect_password_error(&idp, "Your email or password is incorrect. Try again.").await
    })
}

fn unregistered_email(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let email = s.fixture(FixtureName::UnregisteredEmail)?;
        let password = s.fixture(FixtureName::InvalidPassword)?;
        let mut flow = s.flow();
        flow.submit_email(&email).await?;
        flow.submit_password(&password).await?;
        let idp = s.identity().await?;
        expect_password_error(&idp, "Incorrect username or password.").await
    })
}

fn missing_password(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let email = s.fixture(FixtureName::UnregisteredEmail)?;
        s.flow().submit_email(&email).await?;
        let mut idp = s.identity().await?;
        idp.click(Element::ContinueButton).await?;
        expect_single_required_field(&idp).await
    })
}

// successful login

fn successful_login(s: &mut Session) -> CaseFuture<'_> {
    Box::pin(async move {
        let credentials = s.fixtures().credentials()?;
        s.flow()
            .login(&credentials.email, credentials.password.expose())
            .await?;
        s.app()
            .await?
            .get(Element::DashboardRoot)
            .await?
            .to_be_visible()
            .await?;
        Ok(())
    })
}
