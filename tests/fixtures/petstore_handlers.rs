use crate::models::{Order, Pet};

pub struct PetController;

impl PetController {
    /// @Title listPets
    /// @Description List every pet in the store
    /// @Accept json, xml
    /// @Success 200 {array} Pet
    /// @router /pets [get]
    pub async fn list_pets(&self) -> Vec<Pet> {
        Vec::new()
    }

    /// @Title getPet
    /// @Description Find a pet by id
    /// @Param id path int true "id of the pet"
    /// @Success 200 {object} Pet
    /// @Failure 400 invalid id
    /// @Failure 404 pet not found
    /// @router /pets/{id} [get]
    pub async fn get_pet(&self, id: i64) -> Option<Pet> {
        let _ = id;
        None
    }

    /// @Title addPet
    /// @Param pet body Pet true "pet to add"
    /// @Success 201 created
    /// @router /pets [post]
    pub async fn add_pet(&self, pet: Pet) {
        let _ = pet;
    }

    // Not an API endpoint.
    pub fn validate(&self) -> bool {
        true
    }
}

pub struct StoreController;

impl StoreController {
    /// @Title placeOrder
    /// @Accept json
    /// @Param order body Order true "order placed for purchasing the pet"
    /// @Success 200 {object} Order
    /// @Failure 400 invalid order
    /// @router /store/order [post]
    pub async fn place_order(&self, order: Order) -> Order {
        order
    }

    /// @Title deleteOrder
    /// @Param orderId path string true "id of the order"
    /// @Success 204
    /// @router /store/order/:orderId [delete]
    pub async fn delete_order(&self, order_id: String) {
        let _ = order_id;
    }

    /// @Description draft endpoint without a route yet
    pub async fn inventory(&self) {}
}

/// Helper used by the controllers.
pub fn log_request() {}
