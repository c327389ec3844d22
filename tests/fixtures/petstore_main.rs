//! @APIVersion 1.0.0
//! @APITitle Swagger Petstore
//! @APIDescription A sample pet store server
//! @BasePath http://petstore.example.com/api
//! @Contact apiteam@example.com
//! @License Apache 2.0
//! @LicenseUrl http://www.apache.org/licenses/LICENSE-2.0.html

mod handlers;
mod models;

fn main() {}
