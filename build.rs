fn main() {
    slint_build::compile("ui/hillscape.slint").unwrap();
}
