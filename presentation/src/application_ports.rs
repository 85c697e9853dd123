use application_ports::login_code::LoginCodePort;

pub trait Locator {
    fn get_login_code_port(&self) -> &(dyn LoginCodePort + Send + Sync);
}
