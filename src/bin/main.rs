fn main() {
    scryptpool::main();
}
