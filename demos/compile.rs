use palisade::RuleSet;

fn main() {
    let rules = RuleSet::from_file("demos/rules.conf").expect("failed to compile policy");

    println!("{rules}");
    print!("{}", rules.dump());
}
