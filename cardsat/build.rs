use std::process::Command;
use std::str::from_utf8;

fn have_drat_trim() -> bool {
    if let Ok(drat_trim) = Command::new("drat-trim").output() {
        if let Ok(stdout) = from_utf8(&drat_trim.stdout) {
            return stdout.contains("force binary proof parse mode");
        }
    }
    false
}

fn main() {
    if have_drat_trim() {
        println!("cargo:rustc-cfg=test_drat_trim");
    } else {
        println!("cargo:warning=drat-trim utility not found, proof checking tests are disabled");
    }
}
