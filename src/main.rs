fn main() {
    rtoken::cli::run();
}
