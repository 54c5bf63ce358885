use palisade::Driver;

fn main() {
    // One grammar error (recovered) and one validation failure (fatal).
    let policy = r#"
SecRule NOT_A_COLLECTION "@rx x" "id:2,phase:1,pass"
SecRule ARGS "@rx select" "phase:2,deny"
SecAction "id:3,phase:1,pass"
"#;

    let mut driver = Driver::new();
    if driver.parse(policy, "broken.conf") {
        println!("compiled {} rules", driver.rules().len());
    } else {
        print!("{}", driver.diagnostics());
    }
}
