use randsuite_tests::TestKind;

pub fn run() {
    for (i, kind) in TestKind::ALL.iter().enumerate() {
        println!("{:>3}  {:<28} {}", i + 1, kind.name(), kind.title());
    }
}
