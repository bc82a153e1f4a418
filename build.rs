use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=settings.json");

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    // target/<profile>/build/<pkg>/out -> target/<profile>
    let Some(target_dir) = out_dir.ancestors().nth(3) else {
        return;
    };

    if let Err(e) = fs::copy("settings.json", target_dir.join("settings.json")) {
        println!("cargo:warning=could not copy settings.json: {e}");
    }
}
