use std::io::{self, BufRead, Write};

/// Interactive prompting, injected into the login state machines so they can
/// run against scripted input in tests.
pub trait Ui {
    fn get_username_and_password(&self) -> (String, String);
    fn get_line(&self, prompt: &str) -> String;
    fn error(&self, message: &str);
}

pub struct StdUi;

impl Ui for StdUi {
    fn get_username_and_password(&self) -> (String, String) {
        let username = read_from_stdin("Enter your username");
        let password = read_password_from_stdin("Enter your password");
        (username, password)
    }

    fn get_line(&self, prompt: &str) -> String {
        read_from_stdin(prompt)
    }

    fn error(&self, message: &str) {
        eprintln!("{}", message);
    }
}

pub fn read_from_stdin(prompt: &str) -> String {
    let stdin = io::stdin();
    let mut text = String::new();
    while text.trim().is_empty() {
        print!("{}: ", prompt);
        io::stdout().flush().unwrap();
        text.clear();
        stdin.lock().read_line(&mut text).expect("could not read from stdin");
    }
    text.trim().to_string()
}

pub fn read_password_from_stdin(prompt: &str) -> String {
    loop {
        print!("{}: ", prompt);
        io::stdout().flush().unwrap();

        let pass = rpassword::read_password().unwrap();

        if pass.trim().is_empty() {
            continue
        }
        return pass.trim().to_string();
    }
}
