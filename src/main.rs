mod entry;
mod logger;

use ratefire::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
